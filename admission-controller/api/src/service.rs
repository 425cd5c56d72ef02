use crate::Extra;
use serde::{Deserialize, Serialize};

/// A service registered on behalf of a task group.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Service {
    pub name: String,

    /// The label of the port this service is reachable on.
    pub port_label: String,

    pub tags: Vec<String>,
    pub checks: Vec<ServiceCheck>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect: Option<Connect>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ServiceCheck {
    pub name: String,

    #[serde(rename = "Type")]
    pub check_type: String,

    /// The protocol used by the check; only meaningful for `http` and `grpc`
    /// checks.
    pub protocol: String,

    pub path: String,

    /// The label of the port the check listens on.
    pub port_label: String,

    /// Nanoseconds between checks.
    pub interval: u64,

    /// Nanoseconds before a check is considered failed.
    pub timeout: u64,

    #[serde(flatten)]
    pub extra: Extra,
}

/// Service mesh configuration for a service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Connect {
    pub native: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sidecar_service: Option<SidecarService>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SidecarService {
    pub tags: Vec<String>,
    pub port: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<SidecarProxy>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SidecarProxy {
    pub local_service_address: String,
    pub local_service_port: u16,
    pub upstreams: Vec<Upstream>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expose: Option<ExposeConfig>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Upstream {
    pub destination_name: String,
    pub local_bind_port: u16,

    #[serde(flatten)]
    pub extra: Extra,
}

/// Routes that let traffic from outside the namespace reach paths inside it
/// through the sidecar proxy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ExposeConfig {
    /// Derive a path for every compatible check of the service.
    pub checks: bool,

    /// Explicit paths. User-authored entries are kept verbatim; derived
    /// entries are only ever appended.
    pub paths: Vec<ExposePath>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ExposePath {
    pub path: String,
    pub protocol: String,

    /// The port the workload serves `path` on inside the namespace.
    pub local_path_port: u16,

    /// The label of the externally reachable port.
    pub listener_port: String,

    #[serde(flatten)]
    pub extra: Extra,
}

// === impl Service ===

impl Service {
    /// Resolves the service's expose configuration, if every link of the
    /// connect, sidecar, proxy chain is present.
    pub fn expose_config(&self) -> Option<&ExposeConfig> {
        self.connect.as_ref()?.expose_config()
    }

    pub fn expose_config_mut(&mut self) -> Option<&mut ExposeConfig> {
        self.connect.as_mut()?.expose_config_mut()
    }

    /// Indicates whether any expose routing is requested for this service.
    pub fn enables_expose(&self) -> bool {
        self.expose_config().is_some_and(ExposeConfig::is_enabled)
    }

    /// Indicates whether expose paths should be derived from checks.
    pub fn enables_expose_checks(&self) -> bool {
        self.expose_config().is_some_and(|expose| expose.checks)
    }
}

// === impl Connect ===

impl Connect {
    pub fn expose_config(&self) -> Option<&ExposeConfig> {
        self.sidecar_service.as_ref()?.proxy.as_ref()?.expose.as_ref()
    }

    pub fn expose_config_mut(&mut self) -> Option<&mut ExposeConfig> {
        self.sidecar_service.as_mut()?.proxy.as_mut()?.expose.as_mut()
    }
}

// === impl ExposeConfig ===

impl ExposeConfig {
    pub fn is_enabled(&self) -> bool {
        self.checks || !self.paths.is_empty()
    }
}
