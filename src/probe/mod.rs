//! Probe servers: HTTP/HTTPS request-response and ordered TCP acknowledge.

pub mod http;
pub mod tcp;

pub use http::{HttpProbeServer, ProbeResponse};
pub use tcp::{TcpProbePhase, TcpProbeServer};
