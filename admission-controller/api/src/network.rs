use crate::Extra;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, num::NonZeroU16, str::FromStr};

/// A task group's network namespace declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Network {
    pub mode: NetworkMode,
    pub reserved_ports: Vec<Port>,
    pub dynamic_ports: Vec<Port>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// The closed set of network namespace modes a task group may request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum NetworkMode {
    /// Tasks share the host's network stack.
    #[default]
    Host,

    /// Tasks share a namespaced network stack bridged to the host.
    Bridge,

    /// Tasks have no network access.
    None,

    /// Tasks join a namespace configured by the named CNI plugin.
    Cni(String),
}

/// A labeled port reservation.
///
/// The same shape is used for reserved (static) and dynamic ports; a `value`
/// of zero means the port has not been allocated yet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Port {
    pub label: String,
    pub value: u16,
    pub to: PortTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_network: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// The port a reservation maps to inside the network namespace.
///
/// On the wire this is the integer `To` field, where `0` means no explicit
/// target and `-1` asks the scheduler to bind the allocated port number
/// inside the namespace as well.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PortTarget {
    #[default]
    Unset,
    Explicit(NonZeroU16),
    MirrorExternal,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid port target {0}: expected -1, 0, or a port number")]
pub struct PortTargetError(i64);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseNetworkModeError {
    #[error("unknown network mode: {0}")]
    Unknown(String),

    #[error("network mode {0} is missing a CNI plugin name")]
    MissingCniName(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("task group {group} declares no network")]
    Missing { group: String },

    #[error("task group {group} declares {count} networks; only one is supported")]
    Multiple { group: String, count: usize },
}

// === impl Network ===

impl Network {
    pub fn is_bridge(&self) -> bool {
        self.mode == NetworkMode::Bridge
    }

    /// Looks up a port by label, preferring reserved ports.
    pub fn port(&self, label: &str) -> Option<&Port> {
        self.reserved_ports
            .iter()
            .chain(self.dynamic_ports.iter())
            .find(|p| p.label == label)
    }

    /// Returns the port with the given label, registering a dynamic port that
    /// mirrors its allocation into the namespace if no port carries the label.
    ///
    /// Registering is idempotent: an existing reservation is never modified.
    pub fn ensure_dynamic_port(&mut self, label: &str) -> &Port {
        if let Some(idx) = self.reserved_ports.iter().position(|p| p.label == label) {
            return &self.reserved_ports[idx];
        }
        if let Some(idx) = self.dynamic_ports.iter().position(|p| p.label == label) {
            return &self.dynamic_ports[idx];
        }

        let idx = self.dynamic_ports.len();
        self.dynamic_ports.push(Port::mirrored(label));
        &self.dynamic_ports[idx]
    }
}

// === impl Port ===

impl Port {
    /// A dynamic port that binds the same number inside the namespace as the
    /// one allocated on the host.
    pub fn mirrored(label: impl ToString) -> Self {
        Self {
            label: label.to_string(),
            to: PortTarget::MirrorExternal,
            ..Self::default()
        }
    }

    /// The port the workload listens on inside the namespace, if it is known
    /// at admission time.
    pub fn namespace_port(&self) -> Option<u16> {
        match self.to {
            PortTarget::Explicit(port) => Some(port.get()),
            PortTarget::MirrorExternal | PortTarget::Unset => {
                (self.value != 0).then_some(self.value)
            }
        }
    }
}

// === impl PortTarget ===

impl PortTarget {
    const MIRROR_EXTERNAL: i64 = -1;

    pub fn from_raw(raw: i64) -> Result<Self, PortTargetError> {
        match raw {
            0 => Ok(Self::Unset),
            Self::MIRROR_EXTERNAL => Ok(Self::MirrorExternal),
            n => u16::try_from(n)
                .ok()
                .and_then(NonZeroU16::new)
                .map(Self::Explicit)
                .ok_or(PortTargetError(n)),
        }
    }

    pub fn to_raw(self) -> i64 {
        match self {
            Self::Unset => 0,
            Self::Explicit(port) => port.get().into(),
            Self::MirrorExternal => Self::MIRROR_EXTERNAL,
        }
    }
}

impl Serialize for PortTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.to_raw())
    }
}

impl<'de> Deserialize<'de> for PortTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Self::from_raw(raw).map_err(de::Error::custom)
    }
}

// === impl NetworkMode ===

impl FromStr for NetworkMode {
    type Err = ParseNetworkModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "host" => Ok(Self::Host),
            "bridge" => Ok(Self::Bridge),
            "none" => Ok(Self::None),
            s => match s.strip_prefix("cni/") {
                Some("") => Err(ParseNetworkModeError::MissingCniName(s.to_string())),
                Some(name) => Ok(Self::Cni(name.to_string())),
                None => Err(ParseNetworkModeError::Unknown(s.to_string())),
            },
        }
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => f.write_str("host"),
            Self::Bridge => f.write_str("bridge"),
            Self::None => f.write_str("none"),
            Self::Cni(name) => write!(f, "cni/{name}"),
        }
    }
}

impl Serialize for NetworkMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NetworkMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
