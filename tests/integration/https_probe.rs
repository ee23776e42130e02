//! HTTPS probe listener: certificate selection and TLS handshake.

use crate::helpers::*;
use probe_beacon::config::{HttpProbeConfig, HttpsProbeConfig};
use probe_beacon::health::CheckRegistry;
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

/// Test certificate authority
struct TestCa {
    cert: Certificate,
    key: KeyPair,
}

impl TestCa {
    fn new(name: &str) -> Self {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(Vec::new()).unwrap();
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.distinguished_name.push(DnType::CommonName, name);
        let cert = params.self_signed(&key).unwrap();
        Self { cert, key }
    }

    /// Write a `localhost` server certificate and its key into `dir/file`
    fn issue(&self, dir: &Path, file: &str, subject: &str) {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec!["localhost".to_string()]).unwrap();
        params.distinguished_name.push(DnType::CommonName, subject);
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
        params.not_before = rcgen::date_time_ymd(2020, 1, 1);
        params.not_after = rcgen::date_time_ymd(2090, 1, 1);
        let cert = params.signed_by(&key, &self.cert, &self.key).unwrap();

        let pem = format!("{}{}", cert.pem(), key.serialize_pem());
        std::fs::write(dir.join(file), pem).unwrap();
    }

    fn connector(&self) -> TlsConnector {
        let mut roots = RootCertStore::empty();
        roots.add(self.cert.der().clone()).unwrap();

        let provider = Arc::new(tokio_rustls::rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_root_certificates(roots)
            .with_no_client_auth();
        TlsConnector::from(Arc::new(config))
    }
}

/// GET over TLS and return the raw response
async fn tls_get(connector: &TlsConnector, addr: SocketAddr, path: &str) -> String {
    let stream = TcpStream::connect(addr).await.unwrap();
    let domain = ServerName::try_from("localhost").unwrap();
    let mut tls = connector.connect(domain, stream).await.expect("TLS handshake failed");

    let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", path);
    tls.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(10), tls.read_to_end(&mut response))
        .await
        .unwrap()
        .unwrap();
    String::from_utf8(response).unwrap()
}

/// A certificate issued by the configured issuer is served
#[tokio::test]
async fn test_https_probe_with_issuer_certificate() {
    let store = tempfile::tempdir().unwrap();
    let ca = TestCa::new("Probe Test CA");
    ca.issue(store.path(), "server.pem", "probe.local");

    let https = HttpsProbeConfig::new(0)
        .with_issuer("probe test ca")
        .with_stores([store.path()]);
    let config = local_config()
        .with_http(HttpProbeConfig::disabled())
        .with_https(https);
    let host = TestHost::start(config, Arc::new(CheckRegistry::with_defaults())).await;
    let addr = host.bound.https.expect("HTTPS listener not bound");

    let connector = ca.connector();
    assert_eq!(
        tls_get(&connector, addr, "/health/liveness").await,
        "HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n"
    );

    let status = tls_get(&connector, addr, "/health/status").await;
    assert!(status.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(status.contains(r#""status":"Unhealthy""#));

    host.stop().await;
}

/// Plain HTTP on the HTTPS port never reaches the probe logic
#[tokio::test]
async fn test_https_rejects_plaintext() {
    let store = tempfile::tempdir().unwrap();
    let ca = TestCa::new("Plaintext CA");
    ca.issue(store.path(), "server.pem", "probe.local");

    let config = local_config().with_https(HttpsProbeConfig::new(0).with_stores([store.path()]));
    let host = TestHost::start(config, Arc::new(CheckRegistry::with_defaults())).await;
    let addr = host.bound.https.unwrap();

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /health/liveness HTTP/1.1\r\n\r\n")
        .await
        .unwrap();
    let mut response = Vec::new();
    // The server may reset instead of closing cleanly
    let _ = tokio::time::timeout(Duration::from_secs(10), stream.read_to_end(&mut response)).await;
    assert!(!response.starts_with(b"HTTP/1.1 200"));

    // The listener keeps serving TLS clients
    let ok = tls_get(&ca.connector(), addr, "/health/readiness").await;
    assert!(ok.starts_with("HTTP/1.1 200 OK"));

    host.stop().await;
}

/// With no matching certificate HTTPS stays down and HTTP still serves
#[tokio::test]
async fn test_https_without_matching_certificate() {
    let store = tempfile::tempdir().unwrap();
    let ca = TestCa::new("Some Other CA");
    ca.issue(store.path(), "server.pem", "probe.local");

    let https = HttpsProbeConfig::new(0)
        .with_issuer("Expected CA")
        .with_stores([store.path()]);
    let config = local_config()
        .with_http(HttpProbeConfig::new(0))
        .with_https(https);
    let host = TestHost::start(config, Arc::new(CheckRegistry::with_defaults())).await;

    assert!(host.bound.https.is_none());
    assert!(host.bound.http.is_some());

    host.stop().await;
}
