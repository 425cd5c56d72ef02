//! Derives sidecar proxy expose paths from service checks.
//!
//! Services running in a namespaced network are unreachable by health-check
//! probes from the host. When a service's proxy sets `Expose.Checks`, each of
//! its HTTP and gRPC checks gets an expose path routing the check's listener
//! port to the service inside the namespace. Validation then requires every
//! group that uses exposure to run in bridge mode.

pub mod path;


use self::path::RouteKey;
use ahash::AHashSet;
use anyhow::{bail, Result};
use job_admission_api::{ExposeConfig, ExposePath, Job, NetworkError, Service, TaskGroup};
use job_admission_core::{Hook, Warnings};
use tracing::debug;

#[derive(Copy, Clone, Debug, Default)]
pub struct ServiceExposeHook;

impl Hook for ServiceExposeHook {
    fn name(&self) -> &'static str {
        "expose"
    }

    fn mutate(&self, job: &mut Job) -> Result<Warnings> {
        for tg in job.task_groups.iter_mut() {
            for idx in 0..tg.services.len() {
                if !tg.services[idx].enables_expose_checks() {
                    continue;
                }

                let derived = derive_check_paths(tg, idx)?;
                let svc = &mut tg.services[idx];
                if let Some(expose) = svc.expose_config_mut() {
                    let added = append_paths(expose, derived);
                    debug!(group = %tg.name, service = %svc.name, added, "Exposed checks");
                }
            }
        }

        Ok(Warnings::new())
    }

    fn validate(&self, job: &Job) -> Result<Warnings> {
        for tg in job.task_groups.iter() {
            if !tg.services.iter().any(Service::enables_expose) {
                continue;
            }

            match tg.network() {
                Ok(net) if net.is_bridge() => {}
                Ok(net) => bail!(
                    "expose configuration requires bridge network, found {} in task group {}",
                    net.mode,
                    tg.name
                ),
                Err(NetworkError::Missing { .. }) => bail!(
                    "expose configuration requires bridge network, found no network in task group {}",
                    tg.name
                ),
                Err(error) => return Err(error.into()),
            }
        }

        Ok(Warnings::new())
    }
}

/// Builds an expose path for each exposable check of the service at `idx`,
/// registering the service's port with the group's network as needed.
///
/// A check without a port label is served on the service's port, so its
/// path listens on the service's port label.
fn derive_check_paths(tg: &mut TaskGroup, idx: usize) -> Result<Vec<ExposePath>> {
    if !tg.services[idx].checks.iter().any(path::is_exposable) {
        return Ok(Vec::new());
    }

    let label = tg.services[idx].port_label.clone();
    let port = path::resolve_local_port(tg.network_mut()?, &label);

    Ok(tg.services[idx]
        .checks
        .iter()
        .filter_map(|check| {
            let mut path = path::expose_path_for_check(port, check)?;
            if path.listener_port.is_empty() {
                path.listener_port.clone_from(&label);
            }
            Some(path)
        })
        .collect())
}

/// Appends derived paths whose routes are not already present, keeping
/// existing entries and their order. Returns the number of paths added.
fn append_paths(expose: &mut ExposeConfig, derived: Vec<ExposePath>) -> usize {
    let mut routes = expose
        .paths
        .iter()
        .map(RouteKey::from)
        .collect::<AHashSet<_>>();

    let before = expose.paths.len();
    for path in derived {
        if routes.insert(RouteKey::from(&path)) {
            expose.paths.push(path);
        }
    }
    expose.paths.len() - before
}
