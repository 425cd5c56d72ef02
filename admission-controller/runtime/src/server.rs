use hyper::{body::Incoming, Request, Response};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
};
use tokio::net::TcpListener;
use tracing::{debug, info, info_span, warn, Instrument};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Accepts HTTP/1 and HTTP/2 connections on `listener` until `drain` is
/// signaled.
///
/// Each connection holds a clone of `drain`, so draining completes only once
/// every in-flight request has been answered and its connection closed.
pub(crate) async fn serve<S, B>(
    name: &'static str,
    listener: TcpListener,
    service: S,
    drain: drain::Watch,
) where
    S: hyper::service::Service<Request<Incoming>, Response = Response<B>>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError>,
    B: http_body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "{name} server listening");
    }

    loop {
        let (io, client) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(error) => {
                    warn!(%error, "Failed to accept {name} connection");
                    continue;
                }
            },
            _ = drain.clone().signaled() => {
                debug!("{name} server shutting down");
                return;
            }
        };

        let service = service.clone();
        let drain = drain.clone();
        tokio::spawn(
            async move {
                let builder = auto::Builder::new(TokioExecutor::new());
                tokio::pin! {
                    let conn = builder.serve_connection(TokioIo::new(io), service);
                }

                let res = tokio::select! {
                    res = (&mut conn) => res,
                    release = drain.signaled() => {
                        conn.as_mut().graceful_shutdown();
                        release.release_after(conn).await
                    }
                };
                if let Err(error) = res {
                    debug!(%error, "Connection closed");
                }
            }
            .instrument(info_span!("conn", server = %name, %client)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::{BodyExt, Full};
    use std::{convert::Infallible, sync::Arc, time::Duration};
    use tokio::{net::TcpStream, sync::Notify};

    /// Answers each request only once `release` is notified.
    #[derive(Clone, Default)]
    struct Held {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    impl hyper::service::Service<Request<Incoming>> for Held {
        type Response = Response<Full<Bytes>>;
        type Error = Infallible;
        type Future = futures::future::BoxFuture<'static, Result<Self::Response, Infallible>>;

        fn call(&self, _req: Request<Incoming>) -> Self::Future {
            let Self { entered, release } = self.clone();
            Box::pin(async move {
                entered.notify_one();
                release.notified().await;
                Ok(Response::new(Full::new(Bytes::from_static(b"done"))))
            })
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn drain_waits_for_in_flight_requests() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let held = Held::default();
        let (signal, watch) = drain::channel();
        let server = tokio::spawn(serve("test", listener, held.clone(), watch));

        let io = TokioIo::new(TcpStream::connect(addr).await.unwrap());
        let (mut client, conn) = hyper::client::conn::http1::handshake(io).await.unwrap();
        tokio::spawn(conn);

        let req = Request::builder()
            .uri("/")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let rsp = tokio::spawn(client.send_request(req));
        held.entered.notified().await;

        let drained = tokio::spawn(signal.drain());
        server.await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!drained.is_finished(), "drain must wait for the response");

        held.release.notify_one();
        let rsp = rsp.await.unwrap().unwrap();
        assert_eq!(rsp.status(), StatusCode::OK);
        let body = rsp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "done");

        drained.await.unwrap();
    }
}
