//! Health status and probe category types.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Outcome of a check or of a whole category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HealthStatus {
    Unhealthy,
    Degraded,
    Healthy,
}

impl HealthStatus {
    /// Aggregation weight: Unhealthy > Degraded > Healthy.
    #[inline]
    pub fn severity(self) -> u8 {
        match self {
            Self::Healthy => 0,
            Self::Degraded => 1,
            Self::Unhealthy => 2,
        }
    }

    /// Fold statuses with strict precedence. An empty set is Healthy.
    pub fn aggregate<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = HealthStatus>,
    {
        statuses
            .into_iter()
            .max_by_key(|s| s.severity())
            .unwrap_or(Self::Healthy)
    }

    #[inline]
    pub fn is_healthy(self) -> bool {
        self == Self::Healthy
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unhealthy => "Unhealthy",
            Self::Degraded => "Degraded",
            Self::Healthy => "Healthy",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probe category (Kubernetes-compatible, plus the status page).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeCategory {
    /// Detailed status page, HTTP only.
    Status,
    /// Startup probe: wait for initialization.
    Startup,
    /// Readiness probe: remove from load balancer if failed.
    Readiness,
    /// Liveness probe: restart container if failed.
    Liveness,
    /// Request did not match any configured endpoint.
    Unknown,
}

impl ProbeCategory {
    /// Every category that can carry checks, in endpoint matching order.
    pub const PROBES: [ProbeCategory; 4] = [
        Self::Status,
        Self::Startup,
        Self::Readiness,
        Self::Liveness,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Startup => "startup",
            Self::Readiness => "readiness",
            Self::Liveness => "liveness",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProbeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque per-check data.
pub type CheckData = BTreeMap<String, serde_json::Value>;

/// Result of a single check invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub status: HealthStatus,
    pub description: Option<String>,
    /// Captured failure detail.
    pub error: Option<String>,
    pub data: Option<CheckData>,
}

impl CheckResult {
    fn with_status(status: HealthStatus) -> Self {
        Self {
            status,
            description: None,
            error: None,
            data: None,
        }
    }

    pub fn healthy() -> Self {
        Self::with_status(HealthStatus::Healthy)
    }

    pub fn degraded() -> Self {
        Self::with_status(HealthStatus::Degraded)
    }

    pub fn unhealthy() -> Self {
        Self::with_status(HealthStatus::Unhealthy)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_error(mut self, error: impl fmt::Display) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn with_data(mut self, data: CheckData) -> Self {
        self.data = Some(data);
        self
    }

    /// Add one data entry.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}
