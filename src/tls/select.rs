//! Server certificate selection policy.

use std::fmt;

use super::StoredCertificate;
use crate::config::HttpsProbeConfig;

/// One way of picking a server certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateSelector {
    /// Issuer distinguished name contains the value (case-insensitive).
    ByIssuer(String),
    /// Subject distinguished name contains the value (case-insensitive).
    BySubject(String),
    /// Any eligible certificate.
    Any,
}

impl CertificateSelector {
    pub fn matches(&self, cert: &StoredCertificate) -> bool {
        match self {
            Self::ByIssuer(name) => contains_ignore_case(&cert.issuer, name),
            Self::BySubject(name) => contains_ignore_case(&cert.subject, name),
            Self::Any => true,
        }
    }
}

impl fmt::Display for CertificateSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByIssuer(name) => write!(f, "issuer '{}'", name),
            Self::BySubject(name) => write!(f, "subject '{}'", name),
            Self::Any => write!(f, "any server certificate"),
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Ordered selectors; the first one yielding a certificate wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificatePolicy {
    selectors: Vec<CertificateSelector>,
}

impl Default for CertificatePolicy {
    fn default() -> Self {
        Self::new(vec![CertificateSelector::Any])
    }
}

impl CertificatePolicy {
    pub fn new(selectors: Vec<CertificateSelector>) -> Self {
        Self { selectors }
    }

    /// Issuer first, then subject. Falls back to any certificate only when
    /// neither name is configured.
    pub fn from_config(config: &HttpsProbeConfig) -> Self {
        let mut selectors = Vec::new();
        if let Some(ref issuer) = config.issuer_name {
            selectors.push(CertificateSelector::ByIssuer(issuer.clone()));
        }
        if let Some(ref subject) = config.subject_name {
            selectors.push(CertificateSelector::BySubject(subject.clone()));
        }
        if selectors.is_empty() {
            selectors.push(CertificateSelector::Any);
        }
        Self { selectors }
    }

    #[inline]
    pub fn selectors(&self) -> &[CertificateSelector] {
        &self.selectors
    }

    /// Pick a certificate at time `now` (Unix seconds).
    ///
    /// Eligible certificates carry a private key, are allowed for server
    /// authentication and are currently valid. Among the matches of a
    /// selector the one expiring last is chosen.
    pub fn select<'a>(
        &self,
        certificates: &'a [StoredCertificate],
        now: i64,
    ) -> Option<&'a StoredCertificate> {
        self.selectors.iter().find_map(|selector| {
            certificates
                .iter()
                .filter(|cert| is_eligible(cert, now) && selector.matches(cert))
                .max_by_key(|cert| cert.not_after)
        })
    }
}

impl fmt::Display for CertificatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, selector) in self.selectors.iter().enumerate() {
            if i > 0 {
                f.write_str(", then ")?;
            }
            write!(f, "{}", selector)?;
        }
        Ok(())
    }
}

fn is_eligible(cert: &StoredCertificate, now: i64) -> bool {
    cert.has_private_key() && cert.server_auth && cert.is_valid_at(now)
}
