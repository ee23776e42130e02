//! Test helpers and utilities

use probe_beacon::config::{Config, HttpProbeConfig};
use probe_beacon::health::CheckRegistry;
use probe_beacon::{BoundListeners, ProbeHost};
use reqwest::{Client, Response, StatusCode};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Loopback configuration with every listener disabled.
pub fn local_config() -> Config {
    Config::new(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

/// In-process probe host bound to loopback
pub struct TestHost {
    pub host: ProbeHost,
    pub bound: BoundListeners,
    pub client: Client,
}

#[allow(dead_code)]
impl TestHost {
    /// Start a host with only the HTTP listener on an ephemeral port
    pub async fn http(registry: Arc<CheckRegistry>) -> Self {
        Self::start(local_config().with_http(HttpProbeConfig::new(0)), registry).await
    }

    /// Start a host from an arbitrary configuration
    pub async fn start(config: Config, registry: Arc<CheckRegistry>) -> Self {
        let mut host = ProbeHost::new(config, registry).expect("Invalid test configuration");
        let bound = host.start().await.expect("Failed to start probe host");

        // The server closes every connection after one response
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(0)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            host,
            bound,
            client,
        }
    }

    pub fn http_addr(&self) -> SocketAddr {
        self.bound.http.expect("HTTP listener not bound")
    }

    /// Make a GET request to the HTTP listener
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("http://{}{}", self.http_addr(), path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// Send `request` verbatim and return everything the server wrote
    pub async fn raw(&self, request: &str) -> String {
        raw_exchange(self.http_addr(), request).await
    }

    pub async fn stop(mut self) {
        self.host.stop().await;
    }
}

/// Write raw bytes to `addr` and read until the server closes
pub async fn raw_exchange(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("Connect failed");
    stream
        .write_all(request.as_bytes())
        .await
        .expect("Write failed");

    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(10), stream.read_to_end(&mut response))
        .await
        .expect("Server did not close the connection")
        .expect("Read failed");
    String::from_utf8(response).expect("Response is not UTF-8")
}

/// Assert that response has expected status
pub fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(
        response.status(),
        expected,
        "Expected status {}, got {}",
        expected,
        response.status()
    );
}

/// Assert that response contains header
pub fn assert_header(response: &Response, name: &str, expected: &str) {
    let value = response
        .headers()
        .get(name)
        .unwrap_or_else(|| panic!("Header '{}' not found", name))
        .to_str()
        .unwrap();
    assert_eq!(value, expected, "Header '{}' mismatch", name);
}

/// Assert that the response body is empty
pub async fn assert_empty_body(response: Response) {
    let body = response.text().await.expect("Failed to read body");
    assert!(body.is_empty(), "Expected empty body, got: {}", body);
}

/// Parse the status endpoint JSON body
pub async fn status_json(response: Response) -> serde_json::Value {
    assert_header(&response, "content-type", "application/json");
    response.json().await.expect("Status body is not JSON")
}
