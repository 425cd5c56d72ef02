use crate::{admission::Admission, hooks, metrics::AdmissionMetrics, server};
use anyhow::{bail, Result};
use clap::Parser;
use hyper_util::service::TowerToHyperService;
use job_admission_core::Pipeline;
use prometheus_client::registry::Registry;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, info_span, Instrument};

#[derive(Debug, Parser)]
#[clap(name = "job-admission", about = "A job admission controller")]
pub struct Args {
    #[clap(
        long,
        default_value = "job_admission=info,warn",
        env = "JOB_ADMISSION_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// The address jobs are submitted to.
    #[clap(long, default_value = "0.0.0.0:9443", env = "JOB_ADMISSION_ADDR")]
    admission_addr: SocketAddr,

    /// Requests with larger bodies are refused.
    #[clap(long, default_value = "4194304")]
    max_body_bytes: usize,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            admin,
            admission_addr,
            max_body_bytes,
        } = self;

        log_format.try_init(log_level)?;
        let (shutdown, drain) = kubert::shutdown::sigint_or_sigterm()?;

        let mut prom = <Registry>::default();
        let metrics = AdmissionMetrics::register(prom.sub_registry_with_prefix("job_admission"));

        let pipeline = Pipeline::new(hooks::default_hooks());
        info!(hooks = ?pipeline, "Admission pipeline");
        let admission = Admission::new(pipeline, metrics, max_body_bytes);

        let admin = admin.into_builder().with_prometheus(prom).bind()?;
        let ready = admin.readiness();
        let _admin = admin.spawn();

        let listener = TcpListener::bind(admission_addr).await?;
        tokio::spawn(
            server::serve(
                "admission",
                listener,
                TowerToHyperService::new(admission),
                drain,
            )
            .instrument(info_span!("admission")),
        );
        ready.set(true);

        // Block on the shutdown signal. Once it fires, wait for in-flight
        // admissions to complete before exiting.
        if shutdown.signaled().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}
