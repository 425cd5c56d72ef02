use crate::{
    network::{Network, NetworkError},
    service::Service,
    Extra,
};
use serde::{Deserialize, Serialize};

/// A submitted job specification.
///
/// Jobs are identified by their namespace and ID. Hooks mutate a job in place
/// while it moves through the admission pipeline.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Job {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub namespace: String,
    pub region: String,
    pub datacenters: Vec<String>,
    pub task_groups: Vec<TaskGroup>,

    /// Fields the admission pipeline does not interpret, carried through
    /// unchanged.
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct TaskGroup {
    pub name: String,
    pub count: u32,
    pub services: Vec<Service>,
    pub networks: Vec<Network>,

    #[serde(flatten)]
    pub extra: Extra,
}

// === impl Job ===

impl Job {
    const DEFAULT_NAMESPACE: &'static str = "default";

    /// Renders the job's identity as `namespace/id`.
    pub fn namespaced_id(&self) -> String {
        let ns = if self.namespace.is_empty() {
            Self::DEFAULT_NAMESPACE
        } else {
            &self.namespace
        };
        format!("{ns}/{}", self.id)
    }
}

// === impl TaskGroup ===

impl TaskGroup {
    /// Returns the group's network, which must be declared exactly once.
    pub fn network(&self) -> Result<&Network, NetworkError> {
        match self.networks.as_slice() {
            [net] => Ok(net),
            nets => Err(self.network_error(nets.len())),
        }
    }

    pub fn network_mut(&mut self) -> Result<&mut Network, NetworkError> {
        let count = self.networks.len();
        if count != 1 {
            return Err(self.network_error(count));
        }
        Ok(&mut self.networks[0])
    }

    fn network_error(&self, count: usize) -> NetworkError {
        let group = self.name.clone();
        if count == 0 {
            NetworkError::Missing { group }
        } else {
            NetworkError::Multiple { group, count }
        }
    }
}
