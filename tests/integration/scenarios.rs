//! End-to-end behaviour with default and customised registrations.

use crate::helpers::*;
use probe_beacon::config::{ConfigError, HttpProbeConfig, PortAssignment, TcpProbeConfig};
use probe_beacon::health::{add_health_checks, CheckResult, FnCheck};
use probe_beacon::{Error, ProbeHost};
use reqwest::StatusCode;

/// Without custom checks status is Unhealthy and every probe passes
#[tokio::test]
async fn test_default_behavior() {
    let host = TestHost::http(add_health_checks().build()).await;

    let resp = host.get("/health/status").await;
    assert_status(&resp, StatusCode::OK);
    let json = status_json(resp).await;
    assert_eq!(json["status"], "Unhealthy");
    assert_eq!(
        json["healthChecks"][0]["description"],
        "status check has not been customized"
    );

    for path in ["/health/startup", "/health/readiness", "/health/liveness"] {
        assert_status(&host.get(path).await, StatusCode::OK);
    }

    host.stop().await;
}

/// A failing liveness check fails the probe and shows up in status
#[tokio::test]
async fn test_custom_unhealthy_liveness_check() {
    let registry = add_health_checks()
        .add_liveness_check(
            "disk",
            FnCheck::new(|_| async { Ok(CheckResult::unhealthy().with_description("disk full")) }),
        )
        .unwrap()
        .build();
    let host = TestHost::http(registry).await;

    let resp = host.get("/health/liveness").await;
    assert_status(&resp, StatusCode::SERVICE_UNAVAILABLE);
    assert_empty_body(resp).await;

    let json = status_json(host.get("/health/status").await).await;
    assert_eq!(json["status"], "Unhealthy");
    let disk = json["healthChecks"]
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["key"] == "liveness/disk")
        .expect("disk check missing from status");
    assert_eq!(disk["status"], "Unhealthy");
    assert_eq!(disk["description"], "disk full");

    host.stop().await;
}

/// Customising status makes the status endpoint report Healthy
#[tokio::test]
async fn test_customized_status_check() {
    let registry = add_health_checks()
        .add_status_check(
            "self",
            FnCheck::new(|_| async { Ok(CheckResult::healthy().with_entry("uptime_secs", 42)) }),
        )
        .unwrap()
        .build();
    let host = TestHost::http(registry).await;

    let json = status_json(host.get("/health/status").await).await;
    assert_eq!(json["status"], "Healthy");
    assert_eq!(json["healthChecks"][0]["key"], "self");
    assert_eq!(json["healthChecks"][0]["data"]["uptime_secs"], 42);

    host.stop().await;
}

/// HTTP and TCP probes may not share a port
#[tokio::test]
async fn test_port_conflict_rejected() {
    let config = local_config()
        .with_http(HttpProbeConfig::new(8080))
        .with_tcp(TcpProbeConfig::new(PortAssignment {
            startup: Some(8080),
            ..PortAssignment::default()
        }));

    assert!(matches!(
        config.validate(),
        Err(ConfigError::PortConflict { port: 8080, .. })
    ));
    assert!(matches!(
        ProbeHost::new(config, add_health_checks().build()),
        Err(Error::Config(ConfigError::PortConflict { port: 8080, .. }))
    ));
}
