//! Crate-level error type.

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::health::RegistryError;

/// Errors surfaced by [`ProbeHost`](crate::server::ProbeHost) and `main`.
#[derive(Debug)]
pub enum Error {
    Config(ConfigError),
    Registry(RegistryError),
    /// Binding a probe listener failed.
    Bind {
        listener: &'static str,
        source: io::Error,
    },
    /// `start` called on a host that is already running.
    AlreadyStarted,
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "configuration error: {}", e),
            Error::Registry(e) => write!(f, "check registration error: {}", e),
            Error::Bind { listener, source } => {
                write!(f, "failed to bind {} probe listener: {}", listener, source)
            }
            Error::AlreadyStarted => write!(f, "probe host already started"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => Some(e),
            Error::Registry(e) => Some(e),
            Error::Bind { source, .. } => Some(source),
            Error::AlreadyStarted => None,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Error::Registry(e)
    }
}
