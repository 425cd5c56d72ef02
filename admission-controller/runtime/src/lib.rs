#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use job_admission_api as api;
pub use job_admission_core as core;
pub use job_admission_hooks as hooks;

pub mod admission;
mod args;
mod metrics;
mod server;

pub use self::{admission::Admission, args::Args, metrics::AdmissionMetrics};
