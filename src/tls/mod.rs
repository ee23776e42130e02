//! Server certificate discovery and rustls configuration for the HTTPS probe.
//!
//! Certificates are read from PEM stores ([`CertificateStore`]) and picked
//! by a [`CertificatePolicy`]. The resulting `ServerConfig` authenticates the
//! server only; clients are never asked for a certificate.

mod select;
mod store;

pub use select::{CertificatePolicy, CertificateSelector};
pub use store::{unix_now, CertificateStore, StoredCertificate};

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::ServerConfig;
use tracing::{info, warn};

use crate::config::HttpsProbeConfig;

/// Certificate loading or TLS setup error.
#[derive(Debug)]
pub enum CertificateError {
    /// No eligible certificate matched the policy.
    NotFound { policy: String },
    /// Store or file could not be read.
    Io { path: PathBuf, error: io::Error },
    /// File content is not a usable certificate or key.
    InvalidPem { path: PathBuf, message: String },
    /// Selected certificate lacks a private key.
    MissingKey { path: PathBuf },
    /// rustls rejected the configuration.
    Tls(rustls::Error),
}

impl CertificateError {
    pub(crate) fn io(path: &Path, error: io::Error) -> Self {
        CertificateError::Io {
            path: path.to_path_buf(),
            error,
        }
    }

    pub(crate) fn invalid(path: &Path, message: impl fmt::Display) -> Self {
        CertificateError::InvalidPem {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for CertificateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateError::NotFound { policy } => {
                write!(f, "no server certificate found for {}", policy)
            }
            CertificateError::Io { path, error } => {
                write!(f, "failed to read {}: {}", path.display(), error)
            }
            CertificateError::InvalidPem { path, message } => {
                write!(f, "invalid PEM in {}: {}", path.display(), message)
            }
            CertificateError::MissingKey { path } => {
                write!(f, "certificate {} has no private key", path.display())
            }
            CertificateError::Tls(e) => write!(f, "TLS error: {}", e),
        }
    }
}

impl std::error::Error for CertificateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CertificateError::Io { error, .. } => Some(error),
            CertificateError::Tls(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rustls::Error> for CertificateError {
    fn from(e: rustls::Error) -> Self {
        CertificateError::Tls(e)
    }
}

/// Build a server-authenticated rustls config for `cert`, offering HTTP/1.1.
pub fn build_server_config(cert: &StoredCertificate) -> Result<Arc<ServerConfig>, CertificateError> {
    let key = cert
        .key
        .as_ref()
        .ok_or_else(|| CertificateError::MissingKey {
            path: cert.path.clone(),
        })?
        .clone_key();

    let mut config = ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()?
    .with_no_client_auth()
    .with_single_cert(cert.chain.clone(), key)?;

    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(Arc::new(config))
}

/// Scan the configured stores and build the config for the selected certificate.
///
/// Unreadable stores are logged and skipped.
pub fn resolve_server_config(config: &HttpsProbeConfig) -> Result<Arc<ServerConfig>, CertificateError> {
    let policy = CertificatePolicy::from_config(config);

    let mut certificates = Vec::new();
    for path in &config.stores {
        match CertificateStore::open(path).load() {
            Ok(mut certs) => certificates.append(&mut certs),
            Err(e) => warn!(store = %path.display(), error = %e, "Certificate store unavailable"),
        }
    }

    let selected = policy
        .select(&certificates, unix_now())
        .ok_or_else(|| CertificateError::NotFound {
            policy: policy.to_string(),
        })?;

    info!(
        path = %selected.path.display(),
        subject = %selected.subject,
        issuer = %selected.issuer,
        "Server certificate selected"
    );

    build_server_config(selected)
}
