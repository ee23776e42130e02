//! Ordered TCP connect-and-acknowledge probes.
//!
//! Orchestrator TCP probes only test that a connection is accepted. Each
//! configured category is served in a fixed order:
//!
//! ```text
//! startup (once) → readiness (once) → liveness (forever)
//! ```
//!
//! A cycle re-runs the category's checks every retry interval while the
//! aggregate is Unhealthy (Degraded is accepted), then opens the port,
//! accepts a single connection, closes it and closes the port again.

use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::TcpProbeConfig;
use crate::health::{log_probe, log_report, CheckExecutor, HealthStatus, ProbeCategory, ProbeLogOptions};
use crate::listener::bind_reuse_address;

/// Observable state of the TCP probe server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpProbePhase {
    /// Not started.
    Idle,
    /// Running checks until the category is no longer Unhealthy.
    Waiting(ProbeCategory),
    /// Port open, waiting for the probe connection.
    Listening(ProbeCategory, SocketAddr),
    /// Probe connection accepted and closed.
    Acknowledged(ProbeCategory),
    /// Run loop exited.
    Stopped,
}

/// Why a single cycle ended without acknowledging a probe.
#[derive(Debug)]
enum CycleError {
    Cancelled,
    Bind(SocketAddr, io::Error),
    Accept(io::Error),
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleError::Cancelled => write!(f, "cancelled"),
            CycleError::Bind(addr, e) => write!(f, "failed to bind {}: {}", addr, e),
            CycleError::Accept(e) => write!(f, "accept failed: {}", e),
        }
    }
}

pub struct TcpProbeServer {
    bind_addr: IpAddr,
    config: TcpProbeConfig,
    executor: CheckExecutor,
    log_options: ProbeLogOptions,
    phase: watch::Sender<TcpProbePhase>,
}

impl TcpProbeServer {
    pub fn new(
        bind_addr: IpAddr,
        config: TcpProbeConfig,
        executor: CheckExecutor,
        log_options: ProbeLogOptions,
    ) -> Self {
        let (phase, _) = watch::channel(TcpProbePhase::Idle);
        Self {
            bind_addr,
            config,
            executor,
            log_options,
            phase,
        }
    }

    /// Follow the server's phase changes.
    pub fn subscribe(&self) -> watch::Receiver<TcpProbePhase> {
        self.phase.subscribe()
    }

    /// Serve the configured categories in order until `cancel` fires.
    ///
    /// A failed cycle is logged; startup and readiness then move on to the
    /// next category and liveness starts a new cycle after the retry
    /// interval.
    pub async fn run(self, cancel: CancellationToken) {
        let ports = self.config.ports;
        info!(
            startup = ?ports.startup,
            readiness = ?ports.readiness,
            liveness = ?ports.liveness,
            retry_secs = self.config.retry_interval_secs,
            "TCP probe server started"
        );

        for (category, port) in [
            (ProbeCategory::Startup, ports.startup),
            (ProbeCategory::Readiness, ports.readiness),
        ] {
            let Some(port) = port else { continue };
            match self.cycle(category, port, &cancel).await {
                Ok(()) => {}
                Err(CycleError::Cancelled) => return self.stop(),
                Err(e) => error!(category = %category, error = %e, "TCP probe cycle aborted"),
            }
        }

        if let Some(port) = ports.liveness {
            loop {
                match self.cycle(ProbeCategory::Liveness, port, &cancel).await {
                    Ok(()) => {}
                    Err(CycleError::Cancelled) => break,
                    Err(e) => {
                        error!(category = %ProbeCategory::Liveness, error = %e, "TCP probe cycle aborted");
                        if !self.pause(&cancel).await {
                            break;
                        }
                    }
                }
            }
        }

        self.stop()
    }

    fn stop(&self) {
        self.phase.send_replace(TcpProbePhase::Stopped);
        info!("TCP probe server stopped");
    }

    /// One gated accept: wait for the category, open the port, accept one
    /// connection, close everything.
    async fn cycle(
        &self,
        category: ProbeCategory,
        port: u16,
        cancel: &CancellationToken,
    ) -> Result<(), CycleError> {
        self.phase.send_replace(TcpProbePhase::Waiting(category));
        self.wait_until_available(category, cancel).await?;

        let addr = SocketAddr::new(self.bind_addr, port);
        let listener = bind_reuse_address(addr).map_err(|e| CycleError::Bind(addr, e))?;
        let local = listener.local_addr().map_err(CycleError::Accept)?;
        self.phase.send_replace(TcpProbePhase::Listening(category, local));
        debug!(category = %category, addr = %local, "TCP probe port open");

        let remote = tokio::select! {
            biased;

            _ = cancel.cancelled() => return Err(CycleError::Cancelled),
            accepted = listener.accept() => {
                let (stream, remote) = accepted.map_err(CycleError::Accept)?;
                drop(stream);
                remote
            }
        };
        drop(listener);

        log_probe(&self.log_options, category);
        debug!(category = %category, remote = %remote, "TCP probe acknowledged");
        self.phase.send_replace(TcpProbePhase::Acknowledged(category));
        Ok(())
    }

    /// Execute the category's checks until the aggregate is not Unhealthy.
    async fn wait_until_available(
        &self,
        category: ProbeCategory,
        cancel: &CancellationToken,
    ) -> Result<(), CycleError> {
        loop {
            if cancel.is_cancelled() {
                return Err(CycleError::Cancelled);
            }

            let report = self.executor.execute(category, cancel).await;
            log_report(&self.log_options, &report);
            if report.status != HealthStatus::Unhealthy {
                return Ok(());
            }

            debug!(
                category = %category,
                retry_secs = self.config.retry_interval_secs,
                "Category unhealthy, retrying"
            );
            if !self.pause(cancel).await {
                return Err(CycleError::Cancelled);
            }
        }
    }

    /// Sleep for the retry interval. Returns false when cancelled.
    async fn pause(&self, cancel: &CancellationToken) -> bool {
        let interval: Duration = self.config.retry_interval();
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(interval) => true,
        }
    }
}
