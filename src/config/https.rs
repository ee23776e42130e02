//! HTTPS probe listener configuration.

use std::path::PathBuf;

use super::parse::{parse_list, var_opt, var_or, var_port, Lookup};
use super::ConfigError;

/// Default certificate store directories.
pub const DEFAULT_CERT_STORES: &str = "/etc/ssl/private,/etc/ssl/certs";

/// HTTPS probe listener configuration.
///
/// Endpoints and the status body mode are shared with the HTTP listener.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpsProbeConfig {
    /// Listening port, `None` disables the listener.
    pub port: Option<u16>,
    /// Select the server certificate by issuer name.
    pub issuer_name: Option<String>,
    /// Select the server certificate by subject name.
    pub subject_name: Option<String>,
    /// Directories scanned for PEM certificates and keys.
    pub stores: Vec<PathBuf>,
}

impl Default for HttpsProbeConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

impl HttpsProbeConfig {
    pub fn new(port: u16) -> Self {
        Self {
            port: Some(port),
            issuer_name: None,
            subject_name: None,
            stores: parse_list(DEFAULT_CERT_STORES)
                .into_iter()
                .map(PathBuf::from)
                .collect(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            port: None,
            ..Self::new(0)
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer_name = Some(issuer.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject_name = Some(subject.into());
        self
    }

    pub fn with_stores<I, P>(mut self, stores: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.stores = stores.into_iter().map(Into::into).collect();
        self
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.port.is_some()
    }

    pub(crate) fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let stores: Vec<PathBuf> = parse_list(&var_or(lookup, "HTTPS_CERT_STORES", DEFAULT_CERT_STORES))
            .into_iter()
            .map(PathBuf::from)
            .collect();

        Ok(Self {
            port: var_port(lookup, "HTTPS_PROBE_PORT", "off")?,
            issuer_name: var_opt(lookup, "HTTPS_CERT_ISSUER"),
            subject_name: var_opt(lookup, "HTTPS_CERT_SUBJECT"),
            stores,
        })
    }
}
