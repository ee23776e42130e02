//! HTTP probe listener configuration.

use super::parse::{var_bool, var_opt, var_or, var_port, Lookup};
use super::ConfigError;

/// Default endpoint paths.
pub const DEFAULT_STATUS_ENDPOINT: &str = "health/status";
pub const DEFAULT_STARTUP_ENDPOINT: &str = "health/startup";
pub const DEFAULT_READINESS_ENDPOINT: &str = "health/readiness";
pub const DEFAULT_LIVENESS_ENDPOINT: &str = "health/liveness";

/// Endpoint path per probe category.
///
/// Status is always mapped. The other categories may be unmapped, in which
/// case requests for them fall through to 404.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointAssignment {
    pub status: String,
    pub startup: Option<String>,
    pub readiness: Option<String>,
    pub liveness: Option<String>,
}

impl Default for EndpointAssignment {
    fn default() -> Self {
        Self {
            status: DEFAULT_STATUS_ENDPOINT.to_string(),
            startup: Some(DEFAULT_STARTUP_ENDPOINT.to_string()),
            readiness: Some(DEFAULT_READINESS_ENDPOINT.to_string()),
            liveness: Some(DEFAULT_LIVENESS_ENDPOINT.to_string()),
        }
    }
}

impl EndpointAssignment {
    pub(crate) fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let status = var_opt(lookup, "ENDPOINT_STATUS")
            .unwrap_or_else(|| DEFAULT_STATUS_ENDPOINT.to_string());
        if status.eq_ignore_ascii_case("off") {
            return Err(ConfigError::Invalid {
                key: "ENDPOINT_STATUS".into(),
                message: "the status endpoint cannot be disabled".into(),
            });
        }

        let endpoints = Self {
            status,
            startup: endpoint(lookup, "ENDPOINT_STARTUP", DEFAULT_STARTUP_ENDPOINT),
            readiness: endpoint(lookup, "ENDPOINT_READINESS", DEFAULT_READINESS_ENDPOINT),
            liveness: endpoint(lookup, "ENDPOINT_LIVENESS", DEFAULT_LIVENESS_ENDPOINT),
        };
        endpoints.validate()?;
        Ok(endpoints)
    }

    /// Every mapped path needs at least one segment.
    ///
    /// An empty or `/` path is a suffix of every request path, so it would
    /// swallow the other endpoints and the 404 case.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mapped = [
            ("ENDPOINT_STATUS", Some(&self.status)),
            ("ENDPOINT_STARTUP", self.startup.as_ref()),
            ("ENDPOINT_READINESS", self.readiness.as_ref()),
            ("ENDPOINT_LIVENESS", self.liveness.as_ref()),
        ];
        for (key, path) in mapped {
            if let Some(path) = path.filter(|p| p.trim().trim_matches('/').is_empty()) {
                return Err(ConfigError::Invalid {
                    key: key.into(),
                    message: format!("'{}' would match every request path", path),
                });
            }
        }
        Ok(())
    }
}

fn endpoint(lookup: Lookup<'_>, key: &str, default: &str) -> Option<String> {
    let value = var_or(lookup, key, default);
    let value = value.trim();
    if value.eq_ignore_ascii_case("off") {
        None
    } else {
        Some(value.to_string())
    }
}

/// HTTP probe listener configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpProbeConfig {
    /// Listening port, `None` disables the listener.
    pub port: Option<u16>,
    /// Endpoint paths.
    pub endpoints: EndpointAssignment,
    /// Include description, data and exception in the status body.
    pub detailed_status: bool,
}

impl Default for HttpProbeConfig {
    fn default() -> Self {
        Self::new(80)
    }
}

impl HttpProbeConfig {
    pub fn new(port: u16) -> Self {
        Self {
            port: Some(port),
            endpoints: EndpointAssignment::default(),
            detailed_status: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            port: None,
            ..Self::new(0)
        }
    }

    pub fn with_endpoints(mut self, endpoints: EndpointAssignment) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_detailed_status(mut self, detailed: bool) -> Self {
        self.detailed_status = detailed;
        self
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.port.is_some()
    }

    pub(crate) fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            port: var_port(lookup, "HTTP_PROBE_PORT", "80")?,
            endpoints: EndpointAssignment::from_lookup(lookup)?,
            detailed_status: var_bool(lookup, "STATUS_DETAILED", true)?,
        })
    }
}
