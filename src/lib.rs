//! probe_beacon - Health-check probe listeners for orchestrated services.
//!
//! Exposes a service's health to an orchestrator over three mechanisms:
//!
//! - **HTTP / HTTPS**: `GET` endpoints per probe category; the status
//!   endpoint answers with a JSON report, the others with 200 or 503
//! - **TCP**: startup, readiness and liveness ports opened in order, each
//!   accepting a single connection once its checks pass
//!
//! # Architecture
//!
//! Checks are registered per probe category in a [`health::CheckRegistry`].
//! Every probe runs its category's checks through the
//! [`health::CheckExecutor`], which isolates failures and folds the results
//! into one [`health::HealthReport`].
//!
//! # Example
//!
//! ```rust,ignore
//! use probe_beacon::health::{add_health_checks, CheckResult, FnCheck};
//! use probe_beacon::{Config, ProbeHost};
//!
//! let registry = add_health_checks()
//!     .add_readiness_check("db", FnCheck::new(|_| async { Ok(CheckResult::healthy()) }))?
//!     .build();
//! let mut host = ProbeHost::new(Config::from_env()?, registry)?;
//! let bound = host.start().await?;
//! tokio::signal::ctrl_c().await?;
//! host.stop().await;
//! ```

/// Package version from Cargo.toml
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git commit hash (8 chars) with optional "-dirty" suffix
pub const BUILD_VERSION: &str = env!("BUILD_VERSION");

/// Full version string: "0.1.0 (abc12345)" or "0.1.0 (abc12345-dirty)"
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_VERSION"), ")");

pub mod config;
pub mod error;
pub mod health;
pub mod listener;
pub mod logging;
pub mod probe;
pub mod server;
pub mod tls;

// Re-exports for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use server::{BoundListeners, ProbeHost};
