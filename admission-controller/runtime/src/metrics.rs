use job_admission_core::Rejection;
use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};

#[derive(Clone, Debug)]
pub struct AdmissionMetrics {
    requests: Family<ResultLabels, Counter>,
    rejections: Family<RejectionLabels, Counter>,
}

#[derive(Clone, Hash, PartialEq, Eq, EncodeLabelSet, Debug)]
struct ResultLabels {
    result: &'static str,
}

#[derive(Clone, Hash, PartialEq, Eq, EncodeLabelSet, Debug)]
struct RejectionLabels {
    hook: &'static str,
    phase: &'static str,
}

// === impl AdmissionMetrics ===

impl AdmissionMetrics {
    pub fn register(reg: &mut Registry) -> Self {
        let requests = Family::<ResultLabels, Counter>::default();
        reg.register(
            "requests",
            "Total number of job admission requests by result",
            requests.clone(),
        );

        let rejections = Family::<RejectionLabels, Counter>::default();
        reg.register(
            "rejections",
            "Total number of rejected jobs by hook and phase",
            rejections.clone(),
        );

        Self {
            requests,
            rejections,
        }
    }

    pub(crate) fn admitted(&self) {
        self.record("admitted");
    }

    pub(crate) fn rejected(&self, rejection: &Rejection) {
        self.record("rejected");
        self.rejections
            .get_or_create(&RejectionLabels {
                hook: rejection.hook,
                phase: rejection.phase.as_str(),
            })
            .inc();
    }

    /// Records a request that could not be read or parsed as a job.
    pub(crate) fn invalid(&self) {
        self.record("invalid");
    }

    fn record(&self, result: &'static str) {
        self.requests.get_or_create(&ResultLabels { result }).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use job_admission_core::Phase;

    #[test]
    fn encodes_counters() {
        let mut prom = Registry::default();
        let metrics = AdmissionMetrics::register(prom.sub_registry_with_prefix("job_admission"));

        metrics.admitted();
        metrics.admitted();
        metrics.invalid();
        metrics.rejected(&Rejection::new(
            "expose",
            Phase::Validate,
            anyhow::anyhow!("expose configuration requires bridge network"),
        ));

        let mut text = String::new();
        prometheus_client::encoding::text::encode(&mut text, &prom).unwrap();
        assert!(text.contains(r#"job_admission_requests_total{result="admitted"} 2"#), "{text}");
        assert!(text.contains(r#"job_admission_requests_total{result="invalid"} 1"#), "{text}");
        assert!(text.contains(r#"job_admission_requests_total{result="rejected"} 1"#), "{text}");
        assert!(
            text.contains(r#"job_admission_rejections_total{hook="expose",phase="validate"} 1"#),
            "{text}"
        );
    }
}
