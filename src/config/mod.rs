//! Configuration module for probe_beacon.
//!
//! This module provides centralized configuration loading from environment variables.
//!
//! # Example
//!
//! ```rust,ignore
//! use probe_beacon::config::Config;
//!
//! let config = Config::from_env()?;
//! println!("HTTP probe port: {:?}", config.http.port);
//! println!("TCP liveness port: {:?}", config.tcp.ports.liveness);
//! ```

mod error;
mod http;
mod https;
mod logging;
mod parse;
mod tcp;

use std::net::{IpAddr, Ipv4Addr};

pub use error::ConfigError;
pub use http::{
    EndpointAssignment, HttpProbeConfig, DEFAULT_LIVENESS_ENDPOINT, DEFAULT_READINESS_ENDPOINT,
    DEFAULT_STARTUP_ENDPOINT, DEFAULT_STATUS_ENDPOINT,
};
pub use https::HttpsProbeConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use tcp::{PortAssignment, TcpProbeConfig};

use crate::health::ProbeLogOptions;
use parse::{process_env, var_or, Lookup};

/// Complete application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Address every probe listener binds to.
    pub bind_addr: IpAddr,
    /// HTTP probe listener.
    pub http: HttpProbeConfig,
    /// HTTPS probe listener.
    pub https: HttpsProbeConfig,
    /// TCP connect-and-acknowledge listener.
    pub tcp: TcpProbeConfig,
    /// When probes and their outcomes are logged.
    pub probe_log: ProbeLogOptions,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Configuration with every listener disabled, bound to `bind_addr`.
    pub fn new(bind_addr: IpAddr) -> Self {
        Self {
            bind_addr,
            http: HttpProbeConfig::disabled(),
            https: HttpsProbeConfig::disabled(),
            tcp: TcpProbeConfig::default(),
            probe_log: ProbeLogOptions::default(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn with_http(mut self, http: HttpProbeConfig) -> Self {
        self.http = http;
        self
    }

    pub fn with_https(mut self, https: HttpsProbeConfig) -> Self {
        self.https = https;
        self
    }

    pub fn with_tcp(mut self, tcp: TcpProbeConfig) -> Self {
        self.tcp = tcp;
        self
    }

    pub fn with_probe_log(mut self, probe_log: ProbeLogOptions) -> Self {
        self.probe_log = probe_log;
        self
    }

    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&process_env)
    }

    /// Load and validate configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let raw = var_or(lookup, "PROBE_BIND_ADDR", "0.0.0.0");
        let bind_addr: IpAddr = raw.trim().parse().map_err(|e| ConfigError::Parse {
            key: "PROBE_BIND_ADDR".into(),
            value: raw.clone(),
            error: format!("{}", e),
        })?;

        let config = Self {
            bind_addr,
            http: HttpProbeConfig::from_lookup(lookup)?,
            https: HttpsProbeConfig::from_lookup(lookup)?,
            tcp: TcpProbeConfig::from_lookup(lookup)?,
            probe_log: logging::probe_log_from_lookup(lookup)?,
            logging: LoggingConfig::from_lookup(lookup),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check listener invariants before anything binds.
    ///
    /// Port 0 is OS-assigned and never conflicts. TCP ports may repeat
    /// between categories since the TCP listener binds them one at a time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.http.is_enabled() && !self.https.is_enabled() && !self.tcp.is_enabled() {
            return Err(ConfigError::NoProbeConfigured);
        }

        if self.http.is_enabled() || self.https.is_enabled() {
            self.http.endpoints.validate()?;
        }
        self.tcp.validate()?;

        let mut claimed: Vec<(&'static str, &'static str, u16)> = Vec::new();
        if let Some(port) = self.http.port {
            claimed.push(("http", "http", port));
        }
        if let Some(port) = self.https.port {
            claimed.push(("https", "https", port));
        }
        for (name, port) in self.tcp.ports.iter() {
            claimed.push(("tcp", name, port));
        }

        for (i, (kind, name, port)) in claimed.iter().enumerate() {
            if *port == 0 {
                continue;
            }
            if let Some((_, other, _)) = claimed[i + 1..]
                .iter()
                .find(|(k, _, p)| p == port && k != kind)
            {
                return Err(ConfigError::PortConflict {
                    port: *port,
                    first: *name,
                    second: *other,
                });
            }
        }

        Ok(())
    }

    /// Print configuration summary to log.
    pub fn log_summary(&self) {
        use tracing::info;

        info!("Configuration loaded:");
        info!("  Bind address: {}", self.bind_addr);

        match self.http.port {
            Some(port) => info!("  HTTP probe: port {}", port),
            None => info!("  HTTP probe: disabled"),
        }

        if let Some(port) = self.https.port {
            info!("  HTTPS probe: port {}", port);
            if let Some(ref issuer) = self.https.issuer_name {
                info!("  HTTPS certificate issuer: {}", issuer);
            }
            if let Some(ref subject) = self.https.subject_name {
                info!("  HTTPS certificate subject: {}", subject);
            }
            info!("  Certificate stores: {:?}", self.https.stores);
        }

        if self.http.is_enabled() || self.https.is_enabled() {
            let endpoints = &self.http.endpoints;
            info!("  Status endpoint: {}", endpoints.status);
            for (name, path) in [
                ("Startup", &endpoints.startup),
                ("Readiness", &endpoints.readiness),
                ("Liveness", &endpoints.liveness),
            ] {
                match path {
                    Some(path) => info!("  {} endpoint: {}", name, path),
                    None => info!("  {} endpoint: disabled", name),
                }
            }
            info!("  Detailed status: {}", self.http.detailed_status);
        }

        if self.tcp.is_enabled() {
            for (name, port) in self.tcp.ports.iter() {
                info!("  TCP {} probe: port {}", name.trim_start_matches("tcp "), port);
            }
            info!("  TCP retry interval: {}s", self.tcp.retry_interval_secs);
        }

        info!(
            "  Probe logging: probe={} healthy={} degraded={} unhealthy={}",
            self.probe_log.log_probe,
            self.probe_log.log_when_healthy,
            self.probe_log.log_when_degraded,
            self.probe_log.log_when_unhealthy
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED)).with_http(HttpProbeConfig::default())
    }
}
