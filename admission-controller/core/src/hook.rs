use job_admission_api::Job;

/// Advisory messages raised by a hook. Warnings are surfaced to the submitter
/// but never block admission.
pub type Warnings = Vec<String>;

/// A named step of the admission pipeline.
///
/// A hook may rewrite the job in `mutate` and then check it in `validate`.
/// Both phases default to doing nothing, so a hook only implements what it
/// needs. Hooks must hold no mutable state shared across jobs, and running a
/// job through `mutate` twice must leave it as a single pass would.
pub trait Hook: Send + Sync {
    fn name(&self) -> &'static str;

    fn mutate(&self, _job: &mut Job) -> anyhow::Result<Warnings> {
        Ok(Warnings::new())
    }

    fn validate(&self, _job: &Job) -> anyhow::Result<Warnings> {
        Ok(Warnings::new())
    }
}
