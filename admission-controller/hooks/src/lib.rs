#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod expose;

pub use self::expose::ServiceExposeHook;
use job_admission_core::Hook;
use std::sync::Arc;

/// The hooks every job is admitted through, in the order they run.
pub fn default_hooks() -> Vec<Arc<dyn Hook>> {
    vec![Arc::new(ServiceExposeHook)]
}
