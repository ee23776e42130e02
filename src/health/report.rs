//! Aggregate report and its JSON shape.

use std::time::Duration;

use serde::Serialize;

use super::{CheckData, CheckResult, HealthStatus, ProbeCategory};

/// Outcome of executing every check of one category. Built fresh per
/// execution and never mutated.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub category: ProbeCategory,
    pub status: HealthStatus,
    pub entries: Vec<(String, CheckResult)>,
    pub duration: Duration,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportBody<'a> {
    status: HealthStatus,
    health_checks: Vec<EntryBody<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EntryBody<'a> {
    key: &'a str,
    status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a CheckData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exception: Option<&'a str>,
}

impl HealthReport {
    /// Build a report; the overall status is folded from the entries.
    pub fn new(category: ProbeCategory, entries: Vec<(String, CheckResult)>, duration: Duration) -> Self {
        let status = HealthStatus::aggregate(entries.iter().map(|(_, r)| r.status));
        Self {
            category,
            status,
            entries,
            duration,
        }
    }

    #[inline]
    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }

    /// Serialize as `{"status", "healthChecks": [...]}`.
    ///
    /// Without `detailed`, entries only carry key and status.
    pub fn to_json(&self, detailed: bool) -> String {
        let body = ReportBody {
            status: self.status,
            health_checks: self
                .entries
                .iter()
                .map(|(key, result)| EntryBody {
                    key: key.as_str(),
                    status: result.status,
                    description: result.description.as_deref().filter(|_| detailed),
                    data: result.data.as_ref().filter(|_| detailed),
                    exception: result.error.as_deref().filter(|_| detailed),
                })
                .collect(),
        };

        // Plain strings, enums and JSON values only; serialization cannot fail
        serde_json::to_string(&body).unwrap_or_else(|_| format!("{{\"status\":\"{}\"}}", self.status))
    }
}
