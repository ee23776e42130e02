//! When probes and their outcomes are logged.
//!
//! Deciding is pure: [`probe_received`] and [`report_outcome`] return the
//! records to write and [`emit`] hands them to `tracing`.

use tracing::{info, warn};

use super::{HealthReport, HealthStatus, ProbeCategory};
use crate::logging::PROBE_TARGET;

/// Probe logging switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbeLogOptions {
    /// Log every received probe.
    pub log_probe: bool,
    pub log_when_healthy: bool,
    pub log_when_degraded: bool,
    pub log_when_unhealthy: bool,
}

impl Default for ProbeLogOptions {
    fn default() -> Self {
        Self {
            log_probe: true,
            log_when_healthy: false,
            log_when_degraded: true,
            log_when_unhealthy: true,
        }
    }
}

impl ProbeLogOptions {
    /// Every switch off.
    pub fn quiet() -> Self {
        Self {
            log_probe: false,
            log_when_healthy: false,
            log_when_degraded: false,
            log_when_unhealthy: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
}

/// One log line to write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub category: ProbeCategory,
    pub message: String,
    /// Serialized report attached to not-healthy outcomes.
    pub report: Option<String>,
}

impl LogRecord {
    fn new(level: LogLevel, category: ProbeCategory, message: String) -> Self {
        Self {
            level,
            category,
            message,
            report: None,
        }
    }
}

/// Record for an incoming probe, if probes are logged.
pub fn probe_received(options: &ProbeLogOptions, category: ProbeCategory) -> Option<LogRecord> {
    options.log_probe.then(|| {
        LogRecord::new(
            LogLevel::Info,
            category,
            format!("Health check probe: {}", category),
        )
    })
}

/// Records for an executed report.
///
/// Healthy outcomes produce one info line. Degraded and Unhealthy outcomes
/// produce a warning line followed by a warning carrying the detailed report.
pub fn report_outcome(options: &ProbeLogOptions, report: &HealthReport) -> Vec<LogRecord> {
    let enabled = match report.status {
        HealthStatus::Healthy => options.log_when_healthy,
        HealthStatus::Degraded => options.log_when_degraded,
        HealthStatus::Unhealthy => options.log_when_unhealthy,
    };
    if !enabled {
        return Vec::new();
    }

    let summary = format!("Health check result: {}", report.status);
    if report.status.is_healthy() {
        return vec![LogRecord::new(LogLevel::Info, report.category, summary)];
    }

    let mut detail = LogRecord::new(
        LogLevel::Warn,
        report.category,
        "Health check detailed results".to_string(),
    );
    detail.report = Some(report.to_json(true));

    vec![
        LogRecord::new(LogLevel::Warn, report.category, summary),
        detail,
    ]
}

/// Write records through `tracing`.
pub fn emit(records: impl IntoIterator<Item = LogRecord>) {
    for record in records {
        let category = record.category.as_str();
        match (record.level, record.report) {
            (LogLevel::Info, _) => info!(target: PROBE_TARGET, category, "{}", record.message),
            (LogLevel::Warn, Some(report)) => {
                warn!(target: PROBE_TARGET, category, report = report.as_str(), "{}", record.message)
            }
            (LogLevel::Warn, None) => warn!(target: PROBE_TARGET, category, "{}", record.message),
        }
    }
}

/// Decide and emit for an incoming probe.
#[inline]
pub fn log_probe(options: &ProbeLogOptions, category: ProbeCategory) {
    emit(probe_received(options, category));
}

/// Decide and emit for an executed report.
#[inline]
pub fn log_report(options: &ProbeLogOptions, report: &HealthReport) {
    emit(report_outcome(options, report));
}
