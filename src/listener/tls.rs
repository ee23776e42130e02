//! TLS listener implementation using rustls.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::{TcpListener as TokioTcpListener, TcpStream};
use tokio_rustls::rustls::{ProtocolVersion, ServerConfig};
use tokio_rustls::server::TlsStream;
use tokio_rustls::TlsAcceptor;
use tracing::debug;

use super::{bind_reuse_address, Connection, Listener, ListenerFuture, TlsInfo};

/// Default limit for a client to complete the handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

impl Connection for TlsStream<TcpStream> {
    fn remote_addr(&self) -> Option<SocketAddr> {
        self.get_ref().0.peer_addr().ok()
    }

    fn tls_info(&self) -> Option<TlsInfo> {
        let (_, server_conn) = self.get_ref();
        let protocol = match server_conn.protocol_version() {
            Some(ProtocolVersion::TLSv1_2) => "TLSv1.2",
            Some(ProtocolVersion::TLSv1_3) => "TLSv1.3",
            _ => "unknown",
        };

        Some(TlsInfo {
            protocol: protocol.to_string(),
            alpn: server_conn
                .alpn_protocol()
                .map(|p| String::from_utf8_lossy(p).to_string()),
        })
    }
}

/// A TLS listener that accepts server-authenticated connections.
pub struct TlsListener {
    tcp_listener: TokioTcpListener,
    acceptor: TlsAcceptor,
    handshake_timeout: Duration,
}

impl TlsListener {
    /// Bind `addr` and serve `config` on every accepted connection.
    pub fn bind(addr: SocketAddr, config: Arc<ServerConfig>) -> io::Result<Self> {
        Ok(Self::from_parts(
            bind_reuse_address(addr)?,
            TlsAcceptor::from(config),
        ))
    }

    /// Create a TLS listener from an existing TCP listener and acceptor.
    pub fn from_parts(tcp_listener: TokioTcpListener, acceptor: TlsAcceptor) -> Self {
        Self {
            tcp_listener,
            acceptor,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }
}

impl Listener for TlsListener {
    type Conn = TlsStream<TcpStream>;

    fn accept(&self) -> ListenerFuture<'_, (TcpStream, SocketAddr)> {
        Box::pin(async move {
            let (stream, addr) = self.tcp_listener.accept().await?;

            // Set TCP_NODELAY for lower latency
            if let Err(e) = stream.set_nodelay(true) {
                tracing::warn!(error = %e, "Failed to set TCP_NODELAY");
            }

            Ok((stream, addr))
        })
    }

    fn establish(
        &self,
        stream: TcpStream,
        addr: SocketAddr,
    ) -> ListenerFuture<'static, TlsStream<TcpStream>> {
        let acceptor = self.acceptor.clone();
        let timeout = self.handshake_timeout;

        Box::pin(async move {
            // Perform TLS handshake with timing
            let handshake_start = Instant::now();
            let tls_stream = tokio::time::timeout(timeout, acceptor.accept(stream))
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "TLS handshake timed out"))?
                .map_err(|e| io::Error::new(io::ErrorKind::ConnectionAborted, e))?;

            if let Some(info) = tls_stream.tls_info() {
                debug!(
                    remote = %addr,
                    protocol = %info.protocol,
                    alpn = ?info.alpn,
                    handshake_us = handshake_start.elapsed().as_micros() as u64,
                    "TLS handshake completed"
                );
            }

            Ok(tls_stream)
        })
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.tcp_listener.local_addr()
    }

    fn name(&self) -> &'static str {
        "https"
    }

    fn is_tls(&self) -> bool {
        true
    }
}
