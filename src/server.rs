//! Probe host: owns the listeners and their lifecycle.
//!
//! ```text
//! ProbeHost::new(config, registry)   validate configuration
//!     start()  → bind HTTP, HTTPS; spawn TCP sequence
//!     stop()   → cancel token → accept loops and checks end → join
//! ```
//!
//! HTTPS is skipped with an error log when no certificate qualifies; the
//! other listeners still start.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::health::{CheckExecutor, CheckRegistry};
use crate::listener::{TcpListener, TlsListener};
use crate::probe::{HttpProbeServer, TcpProbePhase, TcpProbeServer};
use crate::tls::resolve_server_config;

/// Addresses the started listeners are bound to.
#[derive(Debug, Clone)]
pub struct BoundListeners {
    pub http: Option<SocketAddr>,
    /// `None` when disabled or when no certificate could be selected.
    pub https: Option<SocketAddr>,
    /// TCP probe ports are opened per cycle; follow them here.
    pub tcp: Option<watch::Receiver<TcpProbePhase>>,
}

/// Runs the configured probe listeners against one check registry.
pub struct ProbeHost {
    config: Config,
    executor: CheckExecutor,
    cancel: CancellationToken,
    tasks: JoinSet<()>,
    started: bool,
}

impl ProbeHost {
    /// Validate `config` and bind it to `registry`.
    pub fn new(config: Config, registry: Arc<CheckRegistry>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            executor: CheckExecutor::new(registry),
            cancel: CancellationToken::new(),
            tasks: JoinSet::new(),
            started: false,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn executor(&self) -> &CheckExecutor {
        &self.executor
    }

    /// Token cancelled by [`stop`](Self::stop). Checks observe it too.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Bind and spawn every enabled listener.
    ///
    /// A bind failure on the HTTP or HTTPS port stops the listeners already
    /// spawned and is returned.
    pub async fn start(&mut self) -> Result<BoundListeners> {
        if self.started {
            return Err(Error::AlreadyStarted);
        }
        self.started = true;

        match self.spawn_listeners() {
            Ok(bound) => {
                info!(
                    http = ?bound.http,
                    https = ?bound.https,
                    tcp = bound.tcp.is_some(),
                    "Probe host started"
                );
                Ok(bound)
            }
            Err(e) => {
                self.stop().await;
                Err(e)
            }
        }
    }

    fn spawn_listeners(&mut self) -> Result<BoundListeners> {
        let bind_addr = self.config.bind_addr;
        let log_options = self.config.probe_log;
        let mut bound = BoundListeners {
            http: None,
            https: None,
            tcp: None,
        };

        if let Some(port) = self.config.http.port {
            let listener = TcpListener::bind(SocketAddr::new(bind_addr, port))
                .map_err(|source| Error::Bind { listener: "http", source })?;
            let server = HttpProbeServer::new(
                listener,
                self.executor.clone(),
                &self.config.http,
                log_options,
            );
            bound.http = server.local_addr().ok();
            self.tasks.spawn(server.run(self.cancel.clone()));
        }

        if let Some(port) = self.config.https.port {
            match resolve_server_config(&self.config.https) {
                Ok(tls_config) => {
                    let listener = TlsListener::bind(SocketAddr::new(bind_addr, port), tls_config)
                        .map_err(|source| Error::Bind { listener: "https", source })?;
                    // HTTPS serves the same endpoints as HTTP
                    let server = HttpProbeServer::new(
                        listener,
                        self.executor.clone(),
                        &self.config.http,
                        log_options,
                    );
                    bound.https = server.local_addr().ok();
                    self.tasks.spawn(server.run(self.cancel.clone()));
                }
                Err(e) => {
                    error!(error = %e, "HTTPS probe listener not started");
                }
            }
        }

        if self.config.tcp.is_enabled() {
            let server = TcpProbeServer::new(
                bind_addr,
                self.config.tcp.clone(),
                self.executor.clone(),
                log_options,
            );
            bound.tcp = Some(server.subscribe());
            self.tasks.spawn(server.run(self.cancel.clone()));
        }

        Ok(bound)
    }

    /// Cancel all listeners and in-flight checks and wait for them to end.
    pub async fn stop(&mut self) {
        if !self.cancel.is_cancelled() {
            debug!("Probe host shutting down");
            self.cancel.cancel();
        }

        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Probe listener task failed");
            }
        }

        if self.started {
            info!("Probe host stopped");
        }
    }
}
