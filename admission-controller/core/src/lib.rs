#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod hook;
mod pipeline;


pub use self::{
    hook::{Hook, Warnings},
    pipeline::{Admitted, Phase, Pipeline, Rejection},
};
pub use job_admission_api as api;
