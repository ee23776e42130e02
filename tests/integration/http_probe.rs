//! HTTP probe listener: status codes, wire format, endpoint matching.

use crate::helpers::*;
use probe_beacon::config::{EndpointAssignment, HttpProbeConfig};
use probe_beacon::health::{CheckError, CheckRegistry, CheckResult, FnCheck, ProbeCategory};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn defaults() -> Arc<CheckRegistry> {
    Arc::new(CheckRegistry::with_defaults())
}

/// Probe endpoints answer 200 with an empty body when healthy
#[tokio::test]
async fn test_probe_endpoints_ok() {
    let host = TestHost::http(defaults()).await;

    for path in ["/health/startup", "/health/readiness", "/health/liveness"] {
        let resp = host.get(path).await;
        assert_status(&resp, StatusCode::OK);
        assert_header(&resp, "content-length", "0");
        assert!(resp.headers().get("content-type").is_none());
        assert_empty_body(resp).await;
    }

    host.stop().await;
}

/// Responses are the literal HTTP/1.1 messages
#[tokio::test]
async fn test_wire_format() {
    let host = TestHost::http(defaults()).await;

    assert_eq!(
        host.raw("GET /health/liveness HTTP/1.1\r\nHost: probe\r\n\r\n").await,
        "HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n"
    );
    assert_eq!(
        host.raw("GET /metrics HTTP/1.1\r\n\r\n").await,
        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n"
    );
    assert_eq!(
        host.raw("POST /health/liveness HTTP/1.1\r\n\r\n").await,
        "HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n"
    );

    let status = host.raw("GET /health/status HTTP/1.1\r\n\r\n").await;
    let (head, body) = status.split_once("\r\n\r\n").unwrap();
    assert_eq!(
        head,
        format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nContent-Type: application/json",
            body.len()
        )
    );
    assert!(body.starts_with(r#"{"status":"Unhealthy","healthChecks":["#));

    host.stop().await;
}

/// Path matching ignores case, trailing slash, query and prefixes
#[tokio::test]
async fn test_status_path_variants() {
    let host = TestHost::http(defaults()).await;

    for path in ["/health/status", "/Health/Status/", "/health/status?x=1", "/api/health/status"] {
        let resp = host.get(path).await;
        assert_status(&resp, StatusCode::OK);
        let json = status_json(resp).await;
        assert_eq!(json["status"], "Unhealthy", "{}", path);
    }

    host.stop().await;
}

/// Non-GET methods are rejected before the path is considered
#[tokio::test]
async fn test_method_not_allowed() {
    let host = TestHost::http(defaults()).await;

    let resp = host
        .client
        .head(format!("http://{}/does/not/exist", host.http_addr()))
        .send()
        .await
        .unwrap();
    assert_status(&resp, StatusCode::METHOD_NOT_ALLOWED);

    let resp = host
        .client
        .put(format!("http://{}/health/readiness", host.http_addr()))
        .send()
        .await
        .unwrap();
    assert_status(&resp, StatusCode::METHOD_NOT_ALLOWED);

    host.stop().await;
}

/// A garbage request only drops its own connection
#[tokio::test]
async fn test_malformed_request_keeps_listener_alive() {
    let host = TestHost::http(defaults()).await;

    assert_eq!(host.raw("NONSENSE\r\n\r\n").await, "");
    assert_eq!(host.raw("\r\n\r\n").await, "");

    let resp = host.get("/health/liveness").await;
    assert_status(&resp, StatusCode::OK);

    host.stop().await;
}

/// Disabled endpoints are not served; custom paths are
#[tokio::test]
async fn test_custom_endpoints() {
    let http = HttpProbeConfig::new(0).with_endpoints(EndpointAssignment {
        status: "/internal/state".to_string(),
        startup: None,
        readiness: Some("/ready".to_string()),
        liveness: Some("/alive".to_string()),
    });
    let host = TestHost::start(local_config().with_http(http), defaults()).await;

    assert_status(&host.get("/health/startup").await, StatusCode::NOT_FOUND);
    assert_status(&host.get("/health/status").await, StatusCode::NOT_FOUND);
    assert_status(&host.get("/READY").await, StatusCode::OK);
    assert_status(&host.get("/alive/").await, StatusCode::OK);
    assert_status(&host.get("/internal/state").await, StatusCode::OK);

    host.stop().await;
}

/// Any non-Healthy aggregate turns a probe into 503
#[tokio::test]
async fn test_not_healthy_probes() {
    let registry = CheckRegistry::with_defaults();
    registry
        .register(
            ProbeCategory::Startup,
            "migrations",
            FnCheck::new(|_| async { Ok(CheckResult::degraded().with_description("running")) }),
        )
        .unwrap();
    registry
        .register(
            ProbeCategory::Readiness,
            "database",
            FnCheck::new(|_| async { Err::<CheckResult, _>(CheckError::from("connection refused")) }),
        )
        .unwrap();
    let host = TestHost::http(Arc::new(registry)).await;

    for path in ["/health/startup", "/health/readiness"] {
        let resp = host.get(path).await;
        assert_status(&resp, StatusCode::SERVICE_UNAVAILABLE);
        assert_empty_body(resp).await;
    }
    assert_status(&host.get("/health/liveness").await, StatusCode::OK);

    let json = status_json(host.get("/health/status").await).await;
    let database = json["healthChecks"]
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["key"] == "readiness/database")
        .unwrap();
    assert_eq!(database["status"], "Unhealthy");
    assert_eq!(database["exception"], "connection refused");

    host.stop().await;
}

/// Without detailed status only key and status are reported
#[tokio::test]
async fn test_status_summary_mode() {
    let http = HttpProbeConfig::new(0).with_detailed_status(false);
    let host = TestHost::start(local_config().with_http(http), defaults()).await;

    let json = status_json(host.get("/health/status").await).await;
    for entry in json["healthChecks"].as_array().unwrap() {
        let keys: Vec<_> = entry.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["key".to_string(), "status".to_string()]);
    }

    host.stop().await;
}

/// Stopping the host closes a connection still sending its request
#[tokio::test]
async fn test_stop_closes_pending_connection() {
    let host = TestHost::http(defaults()).await;
    let addr = host.http_addr();

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"GET /health/liveness HTTP/1.1\r\n").await.unwrap();
    // Let the listener accept before shutting down
    tokio::time::sleep(Duration::from_millis(200)).await;

    host.stop().await;
    assert!(TcpStream::connect(addr).await.is_err());

    // The rest of the head may be refused by a closed socket
    let _ = stream.write_all(b"Host: probe\r\n\r\n").await;
    let mut response = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(2), stream.read_to_end(&mut response))
        .await
        .expect("Connection left open after stop");
    assert!(response.is_empty(), "Response after stop: {:?}", String::from_utf8_lossy(&response));
}
