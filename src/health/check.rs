//! Health check trait and built-in default checks.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::CheckResult;

/// Error returned by a failing check.
///
/// The executor turns every error into an Unhealthy result; checks never
/// abort their siblings.
#[derive(Debug)]
pub enum CheckError {
    /// Check-defined failure.
    Failed(String),
    /// I/O error while probing a dependency.
    Io(std::io::Error),
    /// The request was cancelled before the check finished.
    Cancelled,
    /// The check panicked.
    Panicked(String),
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::Failed(msg) => write!(f, "{}", msg),
            CheckError::Io(e) => write!(f, "I/O error: {}", e),
            CheckError::Cancelled => write!(f, "check cancelled"),
            CheckError::Panicked(msg) => write!(f, "check panicked: {}", msg),
        }
    }
}

impl std::error::Error for CheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CheckError {
    fn from(e: std::io::Error) -> Self {
        CheckError::Io(e)
    }
}

impl From<String> for CheckError {
    fn from(msg: String) -> Self {
        CheckError::Failed(msg)
    }
}

impl From<&str> for CheckError {
    fn from(msg: &str) -> Self {
        CheckError::Failed(msg.to_string())
    }
}

/// A unit of health logic bound to one probe category.
///
/// # Example
///
/// ```rust,ignore
/// struct DiskSpace;
///
/// #[async_trait]
/// impl HealthCheck for DiskSpace {
///     async fn check(&self, _cancel: &CancellationToken) -> Result<CheckResult, CheckError> {
///         Ok(CheckResult::unhealthy().with_description("disk full"))
///     }
/// }
/// ```
#[async_trait]
pub trait HealthCheck: Send + Sync + 'static {
    /// Run the check. Long-running checks should observe `cancel`.
    async fn check(&self, cancel: &CancellationToken) -> Result<CheckResult, CheckError>;
}

/// Adapter turning an async closure into a [`HealthCheck`].
pub struct FnCheck<F> {
    f: F,
}

impl<F> FnCheck<F> {
    pub fn new<Fut>(f: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<CheckResult, CheckError>> + Send + 'static,
    {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> HealthCheck for FnCheck<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<CheckResult, CheckError>> + Send + 'static,
{
    async fn check(&self, cancel: &CancellationToken) -> Result<CheckResult, CheckError> {
        (self.f)(cancel.clone()).await
    }
}

/// Default status check. Unhealthy until replaced, so an uncustomized
/// service never reports itself as fine.
pub struct StatusCheck;

#[async_trait]
impl HealthCheck for StatusCheck {
    async fn check(&self, _cancel: &CancellationToken) -> Result<CheckResult, CheckError> {
        Ok(CheckResult::unhealthy().with_description("status check has not been customized"))
    }
}

pub struct StartupCheck;

#[async_trait]
impl HealthCheck for StartupCheck {
    async fn check(&self, _cancel: &CancellationToken) -> Result<CheckResult, CheckError> {
        Ok(CheckResult::healthy())
    }
}

pub struct ReadinessCheck;

#[async_trait]
impl HealthCheck for ReadinessCheck {
    async fn check(&self, _cancel: &CancellationToken) -> Result<CheckResult, CheckError> {
        Ok(CheckResult::healthy())
    }
}

pub struct LivenessCheck;

#[async_trait]
impl HealthCheck for LivenessCheck {
    async fn check(&self, _cancel: &CancellationToken) -> Result<CheckResult, CheckError> {
        Ok(CheckResult::healthy())
    }
}
