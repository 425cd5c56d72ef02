use crate::metrics::AdmissionMetrics;
use futures::future;
use http::{header, Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use job_admission_api::Job;
use job_admission_core::{Admitted, Pipeline, Rejection};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// The path jobs are submitted to.
pub const ADMIT_PATH: &str = "/v1/admit";

/// Serves job admission requests by running each submitted job through the
/// admission pipeline.
#[derive(Clone, Debug)]
pub struct Admission {
    pipeline: Pipeline,
    metrics: AdmissionMetrics,
    max_body_bytes: usize,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read request body: {0}")]
    Request(#[source] BoxError),

    #[error("failed to encode json response: {0}")]
    Json(#[from] serde_json::Error),
}

/// A job register request.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AdmitRequest {
    pub job: Job,
}

/// An admitted job, as mutated by the pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AdmitResponse {
    pub job: Job,
    pub warnings: Vec<String>,
}

/// Identifies the hook that rejected a job.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RejectResponse {
    pub hook: String,
    pub phase: String,
    pub error: String,
}

/// Describes a request that could not be read as a job.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResponse {
    pub error: String,
}

pub type Body = http_body_util::Full<bytes::Bytes>;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// === impl Admission ===

impl<B> tower::Service<Request<B>> for Admission
where
    B: http_body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Response = Response<Body>;
    type Error = Error;
    type Future = future::BoxFuture<'static, Result<Response<Body>, Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        trace!(method = %req.method(), uri = %req.uri());
        if req.uri().path() != ADMIT_PATH {
            return Box::pin(future::ok(empty_response(StatusCode::NOT_FOUND)));
        }
        if req.method() != Method::POST {
            return Box::pin(future::ok(empty_response(StatusCode::METHOD_NOT_ALLOWED)));
        }

        let admission = self.clone();
        Box::pin(async move {
            let body = Limited::new(req.into_body(), admission.max_body_bytes);
            let bytes = match body.collect().await {
                Ok(body) => body.to_bytes(),
                Err(error) if error.is::<LengthLimitError>() => {
                    warn!(limit = admission.max_body_bytes, "Request body too large");
                    admission.metrics.invalid();
                    return json_response(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        &ErrorResponse {
                            error: error.to_string(),
                        },
                    );
                }
                Err(error) => return Err(Error::Request(error)),
            };

            let AdmitRequest { job } = match serde_json::from_slice(&bytes) {
                Ok(req) => req,
                Err(error) => {
                    warn!(%error, "Failed to parse request body");
                    admission.metrics.invalid();
                    return json_response(
                        StatusCode::BAD_REQUEST,
                        &ErrorResponse {
                            error: error.to_string(),
                        },
                    );
                }
            };
            trace!(?job);

            admission.admit(job)
        })
    }
}

impl Admission {
    pub fn new(pipeline: Pipeline, metrics: AdmissionMetrics, max_body_bytes: usize) -> Self {
        Self {
            pipeline,
            metrics,
            max_body_bytes,
        }
    }

    fn admit(&self, job: Job) -> Result<Response<Body>, Error> {
        let id = job.namespaced_id();
        match self.pipeline.admit(job) {
            Ok(Admitted { job, warnings }) => {
                debug!(job = %id, warnings = warnings.len(), "Admitted");
                self.metrics.admitted();
                json_response(StatusCode::OK, &AdmitResponse { job, warnings })
            }
            Err(rejection) => {
                info!(job = %id, %rejection, "Denied");
                self.metrics.rejected(&rejection);
                json_response(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    &RejectResponse::from(&rejection),
                )
            }
        }
    }
}

// === impl RejectResponse ===

impl From<&Rejection> for RejectResponse {
    fn from(rejection: &Rejection) -> Self {
        Self {
            hook: rejection.hook.to_string(),
            phase: rejection.phase.to_string(),
            error: format!("{:#}", rejection.error),
        }
    }
}

fn empty_response(status: StatusCode) -> Response<Body> {
    Response::builder()
        .status(status)
        .body(Body::default())
        .expect("empty response must be valid")
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Result<Response<Body>, Error> {
    let bytes = serde_json::to_vec(body)?;
    Ok(Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(bytes))
        .expect("admission response must be valid"))
}
