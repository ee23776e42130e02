//! Logging configuration.

use super::parse::{process_env, var_bool, var_or, Lookup};
use super::ConfigError;
use crate::health::ProbeLogOptions;

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line JSON records (default).
    #[default]
    Json,
    /// Human-readable tracing output.
    Text,
}

/// Logging configuration loaded from environment.
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Log level filter (from LOG_LEVEL or RUST_LOG).
    pub filter: String,
    /// Service name for structured logging.
    pub service_name: String,
    /// Output format (LOG_FORMAT=json|text).
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "probe_beacon=info".to_string(),
            service_name: "probe_beacon".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl LoggingConfig {
    /// Load configuration from environment variables.
    ///
    /// Priority: LOG_LEVEL > RUST_LOG > default
    ///
    /// LOG_LEVEL accepts simple values: trace, debug, info, warn, error
    /// RUST_LOG accepts full tracing filter syntax: probe_beacon=debug,rustls=warn
    pub fn from_env() -> Self {
        Self::from_lookup(&process_env)
    }

    pub(crate) fn from_lookup(lookup: Lookup<'_>) -> Self {
        let format = match var_or(lookup, "LOG_FORMAT", "json").to_lowercase().as_str() {
            "text" | "pretty" => LogFormat::Text,
            _ => LogFormat::Json,
        };

        Self {
            filter: Self::resolve_log_filter(lookup),
            service_name: var_or(lookup, "SERVICE_NAME", "probe_beacon"),
            format,
        }
    }

    /// Resolve log filter.
    ///
    /// Priority: LOG_LEVEL > RUST_LOG > default (info)
    fn resolve_log_filter(lookup: Lookup<'_>) -> String {
        if let Some(level) = lookup("LOG_LEVEL") {
            let level = level.to_lowercase();
            match level.as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => {
                    return format!("probe_beacon={}", level);
                }
                _ => {
                    // Logging is not up yet, so stderr is the only channel
                    eprintln!(
                        "Warning: Invalid LOG_LEVEL '{}', expected: trace, debug, info, warn, error",
                        level
                    );
                }
            }
        }

        if let Some(filter) = lookup("RUST_LOG") {
            return filter;
        }

        "probe_beacon=info".to_string()
    }
}

/// Load probe logging decisions (LOG_PROBE, LOG_WHEN_*).
pub(crate) fn probe_log_from_lookup(lookup: Lookup<'_>) -> Result<ProbeLogOptions, ConfigError> {
    let defaults = ProbeLogOptions::default();
    Ok(ProbeLogOptions {
        log_probe: var_bool(lookup, "LOG_PROBE", defaults.log_probe)?,
        log_when_healthy: var_bool(lookup, "LOG_WHEN_HEALTHY", defaults.log_when_healthy)?,
        log_when_degraded: var_bool(lookup, "LOG_WHEN_DEGRADED", defaults.log_when_degraded)?,
        log_when_unhealthy: var_bool(lookup, "LOG_WHEN_UNHEALTHY", defaults.log_when_unhealthy)?,
    })
}
