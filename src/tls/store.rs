//! PEM certificate stores.
//!
//! A store is a directory. Every `.pem`, `.crt` or `.cer` file holding at
//! least one certificate is an entry; its private key is read from the same
//! file or from a sibling `<stem>.key`.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls_pemfile::Item;
use tracing::debug;

use super::CertificateError;

const CERT_EXTENSIONS: [&str; 3] = ["pem", "crt", "cer"];

/// Seconds since the Unix epoch, the clock certificate validity is checked against.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// A certificate chain loaded from a store, with the leaf's metadata.
#[derive(Debug)]
pub struct StoredCertificate {
    pub path: PathBuf,
    /// Leaf first.
    pub chain: Vec<CertificateDer<'static>>,
    pub key: Option<PrivateKeyDer<'static>>,
    pub issuer: String,
    pub subject: String,
    /// Unix timestamps.
    pub not_before: i64,
    pub not_after: i64,
    /// No extended key usage extension, or one listing serverAuth.
    pub server_auth: bool,
}

impl StoredCertificate {
    #[inline]
    pub fn has_private_key(&self) -> bool {
        self.key.is_some()
    }

    #[inline]
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.not_before <= now && now <= self.not_after
    }

    /// Load one PEM file. Returns `None` when it holds no certificate.
    pub fn load(path: &Path) -> Result<Option<Self>, CertificateError> {
        let file = File::open(path).map_err(|e| CertificateError::io(path, e))?;
        let mut reader = BufReader::new(file);

        let mut chain = Vec::new();
        let mut key = None;
        for item in rustls_pemfile::read_all(&mut reader) {
            match item.map_err(|e| CertificateError::invalid(path, e))? {
                Item::X509Certificate(der) => chain.push(der),
                Item::Pkcs8Key(der) if key.is_none() => key = Some(PrivateKeyDer::from(der)),
                Item::Pkcs1Key(der) if key.is_none() => key = Some(PrivateKeyDer::from(der)),
                Item::Sec1Key(der) if key.is_none() => key = Some(PrivateKeyDer::from(der)),
                _ => {}
            }
        }

        let Some(leaf) = chain.first() else {
            return Ok(None);
        };

        let (_, cert) = x509_parser::parse_x509_certificate(leaf.as_ref())
            .map_err(|e| CertificateError::invalid(path, format!("invalid X.509: {}", e)))?;

        let server_auth = match cert.extended_key_usage() {
            Ok(Some(eku)) => eku.value.server_auth || eku.value.any,
            Ok(None) => true,
            Err(e) => {
                return Err(CertificateError::invalid(
                    path,
                    format!("invalid extended key usage: {}", e),
                ))
            }
        };

        let validity = cert.validity();
        let issuer = cert.issuer().to_string();
        let subject = cert.subject().to_string();
        let not_before = validity.not_before.timestamp();
        let not_after = validity.not_after.timestamp();

        if key.is_none() {
            key = sibling_key(path)?;
        }

        Ok(Some(Self {
            path: path.to_path_buf(),
            chain,
            key,
            issuer,
            subject,
            not_before,
            not_after,
            server_auth,
        }))
    }
}

/// Private key stored next to the certificate as `<stem>.key`.
fn sibling_key(path: &Path) -> Result<Option<PrivateKeyDer<'static>>, CertificateError> {
    let key_path = path.with_extension("key");
    if !key_path.is_file() {
        return Ok(None);
    }

    let file = File::open(&key_path).map_err(|e| CertificateError::io(&key_path, e))?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(|e| CertificateError::invalid(&key_path, e))
}

/// A directory of PEM certificates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateStore {
    path: PathBuf,
}

impl CertificateStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every certificate in the store, in file name order.
    ///
    /// Unparseable files are logged and skipped; an unreadable directory is
    /// an error.
    pub fn load(&self) -> Result<Vec<StoredCertificate>, CertificateError> {
        let entries = fs::read_dir(&self.path).map_err(|e| CertificateError::io(&self.path, e))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && has_cert_extension(path))
            .collect();
        paths.sort();

        let mut certificates = Vec::with_capacity(paths.len());
        for path in paths {
            match StoredCertificate::load(&path) {
                Ok(Some(cert)) => certificates.push(cert),
                Ok(None) => {}
                Err(e) => debug!(path = %path.display(), error = %e, "Skipping certificate file"),
            }
        }

        Ok(certificates)
    }
}

fn has_cert_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| CERT_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}
