//! TCP connect-and-acknowledge probes: ordering and gating.

use crate::helpers::*;
use probe_beacon::config::{PortAssignment, TcpProbeConfig};
use probe_beacon::health::{CheckRegistry, CheckResult, FnCheck, ProbeCategory};
use probe_beacon::probe::TcpProbePhase;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::watch;

/// A port nothing is listening on right now
fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn listening(rx: &mut watch::Receiver<TcpProbePhase>, category: ProbeCategory) -> SocketAddr {
    let phase = tokio::time::timeout(
        Duration::from_secs(10),
        rx.wait_for(|p| matches!(p, TcpProbePhase::Listening(c, _) if *c == category)),
    )
    .await
    .expect("Category never started listening")
    .unwrap();
    match *phase {
        TcpProbePhase::Listening(_, addr) => addr,
        _ => unreachable!(),
    }
}

/// Liveness stays closed while readiness is stalled
#[tokio::test]
async fn test_liveness_gated_on_readiness() {
    let ready = Arc::new(AtomicBool::new(false));
    let registry = CheckRegistry::with_defaults();
    let flag = Arc::clone(&ready);
    registry
        .register(
            ProbeCategory::Readiness,
            "warmup",
            FnCheck::new(move |_| {
                let done = flag.load(Ordering::SeqCst);
                async move {
                    Ok(if done {
                        CheckResult::healthy()
                    } else {
                        CheckResult::unhealthy().with_description("warming up")
                    })
                }
            }),
        )
        .unwrap();

    let liveness_port = free_port();
    let tcp = TcpProbeConfig::new(PortAssignment {
        startup: Some(0),
        readiness: Some(0),
        liveness: Some(liveness_port),
    })
    .with_retry_interval_secs(1);
    let host = TestHost::start(local_config().with_tcp(tcp), Arc::new(registry)).await;
    let mut rx = host.bound.tcp.clone().expect("TCP probes not started");

    let startup = listening(&mut rx, ProbeCategory::Startup).await;
    TcpStream::connect(startup).await.unwrap();

    rx.wait_for(|p| *p == TcpProbePhase::Waiting(ProbeCategory::Readiness))
        .await
        .unwrap();

    // Several retry intervals pass with readiness unhealthy
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(*rx.borrow(), TcpProbePhase::Waiting(ProbeCategory::Readiness));
    assert!(TcpStream::connect(("127.0.0.1", liveness_port)).await.is_err());

    ready.store(true, Ordering::SeqCst);
    let readiness = listening(&mut rx, ProbeCategory::Readiness).await;
    TcpStream::connect(readiness).await.unwrap();

    let liveness = listening(&mut rx, ProbeCategory::Liveness).await;
    assert_eq!(liveness.port(), liveness_port);
    TcpStream::connect(liveness).await.unwrap();

    host.stop().await;
    assert_eq!(*rx.borrow(), TcpProbePhase::Stopped);
}

/// Startup and readiness ports close for good after one probe
#[tokio::test]
async fn test_startup_and_readiness_accept_once() {
    let startup_port = free_port();
    let tcp = TcpProbeConfig::new(PortAssignment {
        startup: Some(startup_port),
        readiness: Some(0),
        liveness: None,
    })
    .with_retry_interval_secs(1);
    let host = TestHost::start(
        local_config().with_tcp(tcp),
        Arc::new(CheckRegistry::with_defaults()),
    )
    .await;
    let mut rx = host.bound.tcp.clone().unwrap();

    let startup = listening(&mut rx, ProbeCategory::Startup).await;
    TcpStream::connect(startup).await.unwrap();

    let readiness = listening(&mut rx, ProbeCategory::Readiness).await;
    assert!(TcpStream::connect(startup).await.is_err());
    TcpStream::connect(readiness).await.unwrap();

    rx.wait_for(|p| *p == TcpProbePhase::Stopped).await.unwrap();
    assert!(TcpStream::connect(readiness).await.is_err());

    host.stop().await;
}

/// Stopping the host releases a listening liveness port
#[tokio::test]
async fn test_stop_closes_liveness_port() {
    let tcp = TcpProbeConfig::new(PortAssignment {
        liveness: Some(0),
        ..PortAssignment::default()
    });
    let host = TestHost::start(
        local_config().with_tcp(tcp),
        Arc::new(CheckRegistry::with_defaults()),
    )
    .await;
    let mut rx = host.bound.tcp.clone().unwrap();

    let liveness = listening(&mut rx, ProbeCategory::Liveness).await;
    host.stop().await;

    assert_eq!(*rx.borrow(), TcpProbePhase::Stopped);
    assert!(TcpStream::connect(liveness).await.is_err());
}
