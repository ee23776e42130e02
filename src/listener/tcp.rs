//! Plain TCP listener.

use std::io;
use std::net::SocketAddr;

use tokio::net::{TcpListener as TokioTcpListener, TcpStream};

use super::{bind_reuse_address, Connection, Listener, ListenerFuture};

impl Connection for TcpStream {
    fn remote_addr(&self) -> Option<SocketAddr> {
        self.peer_addr().ok()
    }
}

/// A TCP listener that accepts plain TCP connections.
pub struct TcpListener {
    inner: TokioTcpListener,
}

impl TcpListener {
    /// Create a new TCP listener bound to the given address.
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        Ok(Self {
            inner: bind_reuse_address(addr)?,
        })
    }
}

impl Listener for TcpListener {
    type Conn = TcpStream;

    fn accept(&self) -> ListenerFuture<'_, (TcpStream, SocketAddr)> {
        Box::pin(async move {
            let (stream, addr) = self.inner.accept().await?;

            // Set TCP_NODELAY for lower latency
            if let Err(e) = stream.set_nodelay(true) {
                tracing::warn!(error = %e, "Failed to set TCP_NODELAY");
            }

            Ok((stream, addr))
        })
    }

    fn establish(&self, stream: TcpStream, _addr: SocketAddr) -> ListenerFuture<'static, TcpStream> {
        Box::pin(async move { Ok(stream) })
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
