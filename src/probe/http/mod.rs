//! HTTP and HTTPS probe server.
//!
//! A minimal HTTP/1.1 responder written directly against the socket. Each
//! connection serves exactly one request:
//!
//! ```text
//! accept → establish (TLS) → read request line → match endpoint
//!     ├─ method != GET     → 405
//!     ├─ no endpoint       → 404
//!     ├─ status endpoint   → run all checks → 200 + JSON report
//!     └─ probe endpoint    → run checks → 200 if Healthy, else 503
//! → write → close
//! ```

mod endpoint;
mod request;
mod response;

pub use endpoint::EndpointMap;
pub use request::{
    read_request_line, RequestError, RequestLine, DEFAULT_READ_TIMEOUT, MAX_REQUEST_SIZE,
};
pub use response::ProbeResponse;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use crate::config::HttpProbeConfig;
use crate::health::{log_probe, log_report, CheckExecutor, ProbeCategory, ProbeLogOptions};
use crate::listener::{Connection, Listener};

/// Pause after a failed accept so a persistent error does not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Everything a connection task needs.
struct ProbeContext {
    executor: CheckExecutor,
    endpoints: EndpointMap,
    detailed_status: bool,
    log_options: ProbeLogOptions,
    read_timeout: Duration,
}

impl ProbeContext {
    /// Response for a parsed request line.
    async fn respond(&self, request: &RequestLine, cancel: &CancellationToken) -> ProbeResponse {
        if !request.is_get() {
            return ProbeResponse::MethodNotAllowed;
        }

        let category = self.endpoints.resolve(&request.path);
        if category == ProbeCategory::Unknown {
            return ProbeResponse::NotFound;
        }

        log_probe(&self.log_options, category);
        let report = match category {
            ProbeCategory::Status => self.executor.execute_overview(cancel).await,
            _ => self.executor.execute(category, cancel).await,
        };
        log_report(&self.log_options, &report);

        match category {
            ProbeCategory::Status => ProbeResponse::Json(report.to_json(self.detailed_status)),
            _ if report.is_healthy() => ProbeResponse::Ok,
            _ => ProbeResponse::ServiceUnavailable,
        }
    }

    /// Serve one request on an established connection.
    async fn serve<C: Connection>(&self, mut conn: C, cancel: &CancellationToken) -> Result<u16, RequestError> {
        let request = tokio::select! {
            biased;

            _ = cancel.cancelled() => return Err(RequestError::Cancelled),
            read = read_request_line(&mut conn, self.read_timeout) => read?,
        };
        debug!(method = %request.method, path = %request.path, "Probe request");

        let response = self.respond(&request, cancel).await;
        conn.write_all(&response.to_bytes()).await?;
        conn.flush().await?;
        conn.shutdown().await?;

        Ok(response.status_code())
    }
}

/// Accept loop for one HTTP or HTTPS probe listener.
pub struct HttpProbeServer<L> {
    listener: L,
    context: ProbeContext,
}

impl<L: Listener> HttpProbeServer<L> {
    pub fn new(
        listener: L,
        executor: CheckExecutor,
        config: &HttpProbeConfig,
        log_options: ProbeLogOptions,
    ) -> Self {
        Self {
            listener,
            context: ProbeContext {
                executor,
                endpoints: EndpointMap::new(&config.endpoints),
                detailed_status: config.detailed_status,
                log_options,
                read_timeout: DEFAULT_READ_TIMEOUT,
            },
        }
    }

    /// Limit for a client to send its request head.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.context.read_timeout = timeout;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `cancel` fires.
    ///
    /// Connection failures are logged and never stop the loop. Returns once
    /// the listening socket and every accepted connection are closed.
    pub async fn run(self, cancel: CancellationToken) {
        let Self { listener, context } = self;
        let context = Arc::new(context);
        let connections = TaskTracker::new();
        let name = listener.name();
        match listener.local_addr() {
            Ok(addr) => info!(listener = name, addr = %addr, "Probe listener started"),
            Err(e) => warn!(listener = name, error = %e, "Probe listener started, address unknown"),
        }

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    debug!(listener = name, "Shutdown signal received, stopping accept loop");
                    break;
                }
                accepted = listener.accept() => {
                    let (stream, remote_addr) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            error!(listener = name, error = %e, "Accept error");
                            tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                            continue;
                        }
                    };

                    let establish = listener.establish(stream, remote_addr);
                    let context = Arc::clone(&context);
                    let cancel = cancel.clone();
                    let span = tracing::info_span!(
                        "probe_connection",
                        listener = name,
                        conn_id = %Uuid::new_v4().simple(),
                        remote = %remote_addr,
                    );

                    connections.spawn(
                        async move {
                            let established = tokio::select! {
                                biased;

                                _ = cancel.cancelled() => {
                                    debug!("Shutdown during connection setup");
                                    return;
                                }
                                established = establish => established,
                            };
                            let conn = match established {
                                Ok(conn) => conn,
                                Err(e) => {
                                    warn!(error = %e, "Connection setup failed");
                                    return;
                                }
                            };

                            match context.serve(conn, &cancel).await {
                                Ok(status) => debug!(status, "Probe response sent"),
                                Err(RequestError::Empty) => debug!("Connection closed without a request"),
                                Err(RequestError::Cancelled) => debug!("Connection closed by shutdown"),
                                Err(e) => warn!(error = %e, "Probe request failed"),
                            }
                        }
                        .instrument(span),
                    );
                }
            }
        }

        drop(listener);
        connections.close();
        if !connections.is_empty() {
            debug!(listener = name, active = connections.len(), "Waiting for connections to drain");
        }
        connections.wait().await;

        info!(listener = name, "Probe listener stopped");
    }
}
