//! Configuration error types.

use std::fmt;

/// Error type for configuration loading and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to parse environment variable.
    Parse {
        key: String,
        value: String,
        error: String,
    },
    /// Invalid value for environment variable or option.
    Invalid { key: String, message: String },
    /// Two listeners of different probe mechanisms share a port.
    PortConflict {
        port: u16,
        first: &'static str,
        second: &'static str,
    },
    /// Neither HTTP, HTTPS nor TCP probes are configured.
    NoProbeConfigured,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse { key, value, error } => {
                write!(f, "failed to parse {}='{}': {}", key, value, error)
            }
            ConfigError::Invalid { key, message } => {
                write!(f, "invalid value for {}: {}", key, message)
            }
            ConfigError::PortConflict {
                port,
                first,
                second,
            } => write!(
                f,
                "port {} is assigned to both the {} probe and the {} probe",
                port, first, second
            ),
            ConfigError::NoProbeConfigured => write!(f, "no probes have been configured"),
        }
    }
}

impl std::error::Error for ConfigError {}
