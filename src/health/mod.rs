//! Health checks for Kubernetes-style probes.
//!
//! Checks are bound to a probe category in a [`CheckRegistry`]; the
//! [`CheckExecutor`] runs a category and folds the results into a
//! [`HealthReport`]:
//!
//! - **Status**: detailed report, served as JSON over HTTP only
//! - **Startup**: has initialization completed? (wait before other probes)
//! - **Readiness**: can the service handle traffic? (remove from LB if failed)
//! - **Liveness**: is the process alive? (restart container if failed)
//!
//! # Example
//!
//! ```rust,ignore
//! use probe_beacon::health::{add_health_checks, CheckResult, FnCheck};
//!
//! let registry = add_health_checks()
//!     .add_liveness_check("disk", FnCheck::new(|_| async {
//!         Ok(CheckResult::unhealthy().with_description("disk full"))
//!     }))?
//!     .build();
//! ```

mod check;
mod executor;
mod log_policy;
mod registry;
mod report;
mod status;

use std::sync::Arc;

pub use check::{
    CheckError, FnCheck, HealthCheck, LivenessCheck, ReadinessCheck, StartupCheck, StatusCheck,
};
pub use executor::CheckExecutor;
pub use log_policy::{
    emit, log_probe, log_report, probe_received, report_outcome, LogLevel, LogRecord,
    ProbeLogOptions,
};
pub use registry::{
    CheckRegistration, CheckRegistry, RegistryError, DEFAULT_CHECK_NAME, UNREGISTERED_CHECK_NAME,
};
pub use report::HealthReport;
pub use status::{CheckData, CheckResult, HealthStatus, ProbeCategory};

/// Start configuring checks: a registry holding the four default checks.
pub fn add_health_checks() -> HealthChecks {
    HealthChecks::new()
}

/// Chained registration over a [`CheckRegistry`] with defaults installed.
#[derive(Debug)]
pub struct HealthChecks {
    registry: Arc<CheckRegistry>,
}

impl Default for HealthChecks {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthChecks {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(CheckRegistry::with_defaults()),
        }
    }

    pub fn add_check<C: HealthCheck>(
        self,
        category: ProbeCategory,
        name: impl Into<String>,
        check: C,
    ) -> Result<Self, RegistryError> {
        self.registry.register(category, name, check)?;
        Ok(self)
    }

    pub fn add_status_check<C: HealthCheck>(
        self,
        name: impl Into<String>,
        check: C,
    ) -> Result<Self, RegistryError> {
        self.add_check(ProbeCategory::Status, name, check)
    }

    pub fn add_startup_check<C: HealthCheck>(
        self,
        name: impl Into<String>,
        check: C,
    ) -> Result<Self, RegistryError> {
        self.add_check(ProbeCategory::Startup, name, check)
    }

    pub fn add_readiness_check<C: HealthCheck>(
        self,
        name: impl Into<String>,
        check: C,
    ) -> Result<Self, RegistryError> {
        self.add_check(ProbeCategory::Readiness, name, check)
    }

    pub fn add_liveness_check<C: HealthCheck>(
        self,
        name: impl Into<String>,
        check: C,
    ) -> Result<Self, RegistryError> {
        self.add_check(ProbeCategory::Liveness, name, check)
    }

    /// Shared registry; registrations made through it stay visible.
    pub fn registry(&self) -> Arc<CheckRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn build(self) -> Arc<CheckRegistry> {
        self.registry
    }
}
