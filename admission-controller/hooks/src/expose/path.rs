use job_admission_api::{ExposePath, Network, ServiceCheck};
use std::num::NonZeroU16;

/// Check protocols the sidecar proxy knows how to expose.
const EXPOSABLE_PROTOCOLS: [&str; 2] = ["http", "grpc"];

/// Identifies a route independently of the port it resolves to, so that a
/// path derived on an earlier pass is recognized on the next one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(super) struct RouteKey {
    path: String,
    protocol: String,
    listener_port: String,
}

/// Protocols are matched exactly; `HTTP` is not exposable.
pub fn is_exposable(check: &ServiceCheck) -> bool {
    EXPOSABLE_PROTOCOLS.contains(&check.protocol.as_str())
}

/// Builds the expose path for `check`, or `None` when its protocol cannot be
/// exposed.
pub fn expose_path_for_check(local_path_port: u16, check: &ServiceCheck) -> Option<ExposePath> {
    if !is_exposable(check) {
        return None;
    }

    Some(ExposePath {
        path: check.path.clone(),
        protocol: check.protocol.clone(),
        local_path_port,
        listener_port: check.port_label.clone(),
        ..ExposePath::default()
    })
}

/// Resolves the port a service listens on inside the namespace.
///
/// A label that names no port is registered as a dynamic port that mirrors
/// its host allocation. Numeric labels are port numbers, not labels: they
/// resolve to themselves and register nothing. An empty label registers
/// nothing either. The result is zero when the port is only known once it
/// has been allocated.
pub fn resolve_local_port(network: &mut Network, label: &str) -> u16 {
    if label.is_empty() {
        return 0;
    }
    if network.port(label).is_none() {
        if let Ok(port) = label.parse::<NonZeroU16>() {
            return port.get();
        }
    }

    network
        .ensure_dynamic_port(label)
        .namespace_port()
        .unwrap_or_default()
}

// === impl RouteKey ===

impl From<&ExposePath> for RouteKey {
    fn from(path: &ExposePath) -> Self {
        Self {
            path: path.path.clone(),
            protocol: path.protocol.clone(),
            listener_port: path.listener_port.clone(),
        }
    }
}
