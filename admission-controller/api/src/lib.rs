#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! The job specification as it is seen by the admission pipeline.
//!
//! Field names follow the job-specification JSON (PascalCase). Only the
//! fields admission acts on are modeled; everything else is kept in each
//! type's `extra` map so that a job round-trips through these types unchanged.

pub mod job;
pub mod network;
pub mod service;

pub use self::{
    job::{Job, TaskGroup},
    network::{
        Network, NetworkError, NetworkMode, ParseNetworkModeError, Port, PortTarget,
        PortTargetError,
    },
    service::{
        Connect, ExposeConfig, ExposePath, Service, ServiceCheck, SidecarProxy, SidecarService,
        Upstream,
    },
};

/// Job-specification fields that are not modeled, keyed by their wire name.
pub type Extra = serde_json::Map<String, serde_json::Value>;
