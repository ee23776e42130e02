//! Per-category check execution.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::{CheckError, CheckRegistration, CheckRegistry, CheckResult, HealthReport, ProbeCategory};

/// Runs every check bound to a category and folds the outcome.
///
/// Checks run one after another in registration order. Each runs in its own
/// task so that a panic is contained the same way as a returned error.
#[derive(Clone, Debug)]
pub struct CheckExecutor {
    registry: Arc<CheckRegistry>,
}

impl CheckExecutor {
    pub fn new(registry: Arc<CheckRegistry>) -> Self {
        Self { registry }
    }

    #[inline]
    pub fn registry(&self) -> &Arc<CheckRegistry> {
        &self.registry
    }

    /// Execute the checks bound to `category`.
    ///
    /// Never fails: errors, panics and cancellation become Unhealthy entries.
    pub async fn execute(&self, category: ProbeCategory, cancel: &CancellationToken) -> HealthReport {
        let start = Instant::now();
        let registrations = self.registry.lookup(category);
        let entries = self.run_all(registrations, cancel, false).await;
        HealthReport::new(category, entries, start.elapsed())
    }

    /// Report served by the status endpoint: the Status checks followed by
    /// the Startup, Readiness and Liveness checks, folded together.
    ///
    /// Probe category entries are keyed `<category>/<name>` so equal names in
    /// different categories stay apart; Status entries keep their bare name.
    pub async fn execute_overview(&self, cancel: &CancellationToken) -> HealthReport {
        let start = Instant::now();
        let registrations = ProbeCategory::PROBES
            .into_iter()
            .flat_map(|category| self.registry.lookup(category))
            .collect();
        let entries = self.run_all(registrations, cancel, true).await;
        HealthReport::new(ProbeCategory::Status, entries, start.elapsed())
    }

    async fn run_all(
        &self,
        registrations: Vec<Arc<CheckRegistration>>,
        cancel: &CancellationToken,
        qualify_keys: bool,
    ) -> Vec<(String, CheckResult)> {
        let mut entries = Vec::with_capacity(registrations.len());

        for registration in registrations {
            let category = registration.category();
            let name = registration.display_name().to_string();

            let result = if cancel.is_cancelled() {
                CheckResult::unhealthy().with_error(CheckError::Cancelled)
            } else {
                match run_check(&registration, cancel).await {
                    Ok(result) => result,
                    Err(CheckError::Cancelled) => {
                        debug!(category = %category, check = %name, "Health check cancelled");
                        CheckResult::unhealthy().with_error(CheckError::Cancelled)
                    }
                    Err(e) => {
                        error!(
                            category = %category,
                            check = %name,
                            implementation = registration.type_name(),
                            error = %e,
                            "Health check failed"
                        );
                        CheckResult::unhealthy().with_error(e)
                    }
                }
            };

            let key = match category {
                ProbeCategory::Status => name,
                _ if qualify_keys => format!("{}/{}", category, name),
                _ => name,
            };
            entries.push((key, result));
        }

        entries
    }
}

async fn run_check(
    registration: &CheckRegistration,
    cancel: &CancellationToken,
) -> Result<CheckResult, CheckError> {
    let check = registration.check();
    let token = cancel.clone();
    let mut handle = tokio::spawn(async move { check.check(&token).await });

    tokio::select! {
        joined = &mut handle => match joined {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(CheckError::Panicked(panic_message(e.into_panic()))),
            Err(_) => Err(CheckError::Cancelled),
        },
        _ = cancel.cancelled() => {
            handle.abort();
            Err(CheckError::Cancelled)
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
