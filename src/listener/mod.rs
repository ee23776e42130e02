//! Listener abstractions for accepting probe connections.
//!
//! Accepting is split in two steps so the accept loop never waits on a
//! slow client: [`Listener::accept`] returns the raw TCP stream and
//! [`Listener::establish`] finishes the connection (the TLS handshake for
//! [`TlsListener`]) inside the per-connection task.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                Listener trait                │
//! ├──────────────────────────────────────────────┤
//! │  ┌─────────────┐        ┌─────────────┐      │
//! │  │ TcpListener │        │ TlsListener │      │
//! │  │   (tcp.rs)  │        │   (tls.rs)  │      │
//! │  └──────┬──────┘        └──────┬──────┘      │
//! │         └───────────┬──────────┘             │
//! │             ┌───────▼───────┐                │
//! │             │   Connection  │                │
//! │             └───────────────┘                │
//! └──────────────────────────────────────────────┘
//! ```

mod tcp;
mod tls;

pub use tcp::TcpListener;
pub use tls::TlsListener;

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Pending listen queue length for probe sockets.
const LISTEN_BACKLOG: i32 = 128;

/// A connection accepted by a listener.
pub trait Connection: AsyncRead + AsyncWrite + Send + Unpin + 'static {
    /// Get the remote address of the connection.
    fn remote_addr(&self) -> Option<SocketAddr>;

    /// Get TLS information if this is a TLS connection.
    fn tls_info(&self) -> Option<TlsInfo> {
        None
    }
}

/// TLS connection information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsInfo {
    /// TLS protocol version (e.g., "TLSv1.3").
    pub protocol: String,
    /// ALPN negotiated protocol (e.g., "http/1.1").
    pub alpn: Option<String>,
}

/// Boxed future returned by listener operations.
pub type ListenerFuture<'a, T> = Pin<Box<dyn Future<Output = io::Result<T>> + Send + 'a>>;

/// Trait for listening and accepting connections.
pub trait Listener: Send + Sync + 'static {
    /// The connection type produced by this listener.
    type Conn: Connection;

    /// Accept a raw TCP connection and its remote address.
    fn accept(&self) -> ListenerFuture<'_, (TcpStream, SocketAddr)>;

    /// Turn an accepted stream into a connection.
    ///
    /// The returned future owns everything it needs so it can run on a
    /// separate task.
    fn establish(&self, stream: TcpStream, addr: SocketAddr) -> ListenerFuture<'static, Self::Conn>;

    /// Get the local address this listener is bound to.
    fn local_addr(&self) -> io::Result<SocketAddr>;

    /// Get the listener name for logging.
    fn name(&self) -> &'static str;

    /// Check if this listener uses TLS.
    fn is_tls(&self) -> bool {
        false
    }
}

/// Bind a listening socket with SO_REUSEADDR.
///
/// Probe ports are closed and reopened repeatedly, so a socket lingering in
/// TIME_WAIT must not block the next bind.
pub fn bind_reuse_address(addr: SocketAddr) -> io::Result<tokio::net::TcpListener> {
    let domain = if addr.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;

    tokio::net::TcpListener::from_std(socket.into())
}
