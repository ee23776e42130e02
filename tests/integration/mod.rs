//! Integration tests for probe_beacon
//!
//! Each test starts an in-process probe host on loopback ephemeral ports.
//! Run with: cargo test --test integration

mod helpers;

mod http_probe;
mod https_probe;
mod scenarios;
mod tcp_probe;
