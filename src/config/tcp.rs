//! TCP connect-and-acknowledge probe configuration.

use std::time::Duration;

use super::parse::{var_parse, var_port, Lookup};
use super::ConfigError;

pub const DEFAULT_RETRY_INTERVAL_SECS: u8 = 5;
pub const MAX_RETRY_INTERVAL_SECS: u8 = 60;

/// TCP port per probe category. `None` leaves the category unserved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PortAssignment {
    pub startup: Option<u16>,
    pub readiness: Option<u16>,
    pub liveness: Option<u16>,
}

impl PortAssignment {
    /// Configured ports with their probe label.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u16)> {
        [
            ("tcp startup", self.startup),
            ("tcp readiness", self.readiness),
            ("tcp liveness", self.liveness),
        ]
        .into_iter()
        .filter_map(|(name, port)| port.map(|p| (name, p)))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.startup.is_none() && self.readiness.is_none() && self.liveness.is_none()
    }
}

/// TCP probe configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TcpProbeConfig {
    pub ports: PortAssignment,
    /// Delay between check executions while a category is unhealthy.
    pub retry_interval_secs: u8,
}

impl Default for TcpProbeConfig {
    fn default() -> Self {
        Self {
            ports: PortAssignment::default(),
            retry_interval_secs: DEFAULT_RETRY_INTERVAL_SECS,
        }
    }
}

impl TcpProbeConfig {
    pub fn new(ports: PortAssignment) -> Self {
        Self {
            ports,
            ..Self::default()
        }
    }

    pub fn with_retry_interval_secs(mut self, secs: u8) -> Self {
        self.retry_interval_secs = secs;
        self
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        !self.ports.is_empty()
    }

    #[inline]
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.retry_interval_secs) * 1000)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_RETRY_INTERVAL_SECS).contains(&self.retry_interval_secs) {
            return Err(ConfigError::Invalid {
                key: "TCP_RETRY_INTERVAL_SECS".into(),
                message: format!("must be between 1 and {}", MAX_RETRY_INTERVAL_SECS),
            });
        }
        Ok(())
    }

    pub(crate) fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            ports: PortAssignment {
                startup: var_port(lookup, "TCP_STARTUP_PORT", "off")?,
                readiness: var_port(lookup, "TCP_READINESS_PORT", "off")?,
                liveness: var_port(lookup, "TCP_LIVENESS_PORT", "off")?,
            },
            retry_interval_secs: var_parse(
                lookup,
                "TCP_RETRY_INTERVAL_SECS",
                DEFAULT_RETRY_INTERVAL_SECS,
            )?,
        })
    }
}
