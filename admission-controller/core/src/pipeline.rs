use crate::hook::{Hook, Warnings};
use job_admission_api::Job;
use std::{fmt, sync::Arc};
use tracing::{debug, info, info_span};

/// An ordered list of hooks that every submitted job passes through.
#[derive(Clone)]
pub struct Pipeline {
    hooks: Arc<[Arc<dyn Hook>]>,
}

/// A job that passed every hook, along with the warnings they raised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Admitted {
    pub job: Job,
    pub warnings: Warnings,
}

/// The first hook failure encountered for a job.
#[derive(Debug, thiserror::Error)]
#[error("{phase} hook {hook}: {error:#}")]
pub struct Rejection {
    pub hook: &'static str,
    pub phase: Phase,
    pub error: anyhow::Error,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Mutate,
    Validate,
}

// === impl Pipeline ===

impl Pipeline {
    pub fn new(hooks: impl IntoIterator<Item = Arc<dyn Hook>>) -> Self {
        Self {
            hooks: hooks.into_iter().collect(),
        }
    }

    /// The names of the pipeline's hooks, in the order they run.
    pub fn hook_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.hooks.iter().map(|hook| hook.name())
    }

    /// Runs `job` through each hook's `mutate` and then `validate` phase.
    ///
    /// The first error rejects the job and no further hooks run. The job is
    /// taken by value so that a rejected job never leaks partial mutations
    /// back to the caller.
    pub fn admit(&self, mut job: Job) -> Result<Admitted, Rejection> {
        let span = info_span!("admit", job = %job.namespaced_id());
        let _enter = span.enter();

        let mut warnings = Warnings::new();
        for hook in self.hooks.iter() {
            if let Err(rejection) = Self::apply(hook.as_ref(), &mut job, &mut warnings) {
                info!(%rejection, "Rejected");
                return Err(rejection);
            }
        }

        debug!(warnings = warnings.len(), "Admitted");
        Ok(Admitted { job, warnings })
    }

    fn apply(hook: &dyn Hook, job: &mut Job, warnings: &mut Warnings) -> Result<(), Rejection> {
        let name = hook.name();

        let ws = hook
            .mutate(job)
            .map_err(|error| Rejection::new(name, Phase::Mutate, error))?;
        debug!(hook = %name, warnings = ws.len(), "Mutated");
        Self::record(name, ws, warnings);

        let ws = hook
            .validate(job)
            .map_err(|error| Rejection::new(name, Phase::Validate, error))?;
        debug!(hook = %name, warnings = ws.len(), "Validated");
        Self::record(name, ws, warnings);

        Ok(())
    }

    fn record(hook: &'static str, ws: Warnings, warnings: &mut Warnings) {
        for warning in ws {
            info!(%hook, %warning, "Admission warning");
            warnings.push(warning);
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.hook_names()).finish()
    }
}

// === impl Rejection ===

impl Rejection {
    pub fn new(hook: &'static str, phase: Phase, error: anyhow::Error) -> Self {
        Self { hook, phase, error }
    }
}

// === impl Phase ===

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mutate => "mutate",
            Self::Validate => "validate",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
