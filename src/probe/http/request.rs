//! Request line parsing.
//!
//! Only the method and path are used; headers and body are read past and
//! ignored.

use std::fmt;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::Instant;

/// Maximum bytes read from one request.
pub const MAX_REQUEST_SIZE: usize = 10 * 1024;

/// Default time a client gets to send its request head.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

const READ_CHUNK: usize = 1024;

/// Per-connection request error.
#[derive(Debug)]
pub enum RequestError {
    /// I/O error while reading.
    Io(io::Error),
    /// Connection closed before sending anything.
    Empty,
    /// Request line is not `METHOD SP PATH [SP VERSION]`.
    Malformed(String),
    /// No line break within the size limit.
    TooLarge,
    /// Shutdown began before the request arrived.
    Cancelled,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Io(e) => write!(f, "I/O error: {}", e),
            RequestError::Empty => write!(f, "empty request"),
            RequestError::Malformed(msg) => write!(f, "malformed request line: {}", msg),
            RequestError::TooLarge => {
                write!(f, "request line exceeds {} bytes", MAX_REQUEST_SIZE)
            }
            RequestError::Cancelled => write!(f, "cancelled before the request arrived"),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RequestError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RequestError {
    fn from(e: io::Error) -> Self {
        RequestError::Io(e)
    }
}

/// Parsed `METHOD SP PATH [SP VERSION]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    /// Raw request target, query string included.
    pub path: String,
    pub version: Option<String>,
}

impl RequestLine {
    /// Parse the first line of `head`.
    pub fn parse(head: &[u8]) -> Result<Self, RequestError> {
        if head.iter().all(u8::is_ascii_whitespace) {
            return Err(RequestError::Empty);
        }

        let line = match head.iter().position(|&b| b == b'\n') {
            Some(end) => &head[..end],
            None if head.len() >= MAX_REQUEST_SIZE => return Err(RequestError::TooLarge),
            None => head,
        };

        let line = std::str::from_utf8(line)
            .map_err(|_| RequestError::Malformed("request line is not UTF-8".into()))?;

        let mut parts = line.split_ascii_whitespace();
        let (Some(method), Some(path)) = (parts.next(), parts.next()) else {
            return Err(RequestError::Malformed(line.trim().to_string()));
        };

        Ok(Self {
            method: method.to_string(),
            path: path.to_string(),
            version: parts.next().map(str::to_string),
        })
    }

    #[inline]
    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }
}

/// Read the request head and parse its first line.
///
/// Reads until the blank line ending the head, end of stream, the size
/// limit or `timeout`, whichever comes first. Whatever arrived by then is
/// parsed.
pub async fn read_request_line<R>(reader: &mut R, timeout: Duration) -> Result<RequestLine, RequestError>
where
    R: AsyncRead + Unpin,
{
    let deadline = Instant::now() + timeout;
    let mut head = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    while head.len() < MAX_REQUEST_SIZE && !ends_head(&head) {
        let n = match tokio::time::timeout_at(deadline, reader.read(&mut chunk)).await {
            Ok(read) => read?,
            Err(_) => break,
        };
        if n == 0 {
            break;
        }
        let take = n.min(MAX_REQUEST_SIZE - head.len());
        head.extend_from_slice(&chunk[..take]);
    }

    RequestLine::parse(&head)
}

/// Blank line after the head, CRLF or bare LF.
fn ends_head(head: &[u8]) -> bool {
    head.windows(4).any(|w| w == b"\r\n\r\n") || head.windows(2).any(|w| w == b"\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[test]
    fn test_parse() {
        let line = RequestLine::parse(b"GET /health/status?x=1 HTTP/1.1\r\nHost: a\r\n\r\n").unwrap();
        assert_eq!(line.method, "GET");
        assert_eq!(line.path, "/health/status?x=1");
        assert_eq!(line.version.as_deref(), Some("HTTP/1.1"));
        assert!(line.is_get());

        let line = RequestLine::parse(b"POST /health/liveness").unwrap();
        assert!(!line.is_get());
        assert_eq!(line.version, None);

        // Methods are case-sensitive
        assert!(!RequestLine::parse(b"get /health/liveness HTTP/1.1\r\n").unwrap().is_get());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(RequestLine::parse(b""), Err(RequestError::Empty)));
        assert!(matches!(RequestLine::parse(b"\r\n"), Err(RequestError::Empty)));
        assert!(matches!(
            RequestLine::parse(b"GET\r\n\r\n"),
            Err(RequestError::Malformed(_))
        ));
        assert!(matches!(
            RequestLine::parse(&[b'A'; MAX_REQUEST_SIZE]),
            Err(RequestError::TooLarge)
        ));
        assert!(matches!(
            RequestLine::parse(b"GET /\xff\xfe HTTP/1.1\r\n"),
            Err(RequestError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_read_split_request() {
        let mut stream = Builder::new()
            .read(b"GET /hea")
            .read(b"lth/readiness HTTP/1.1\r\n")
            .read(b"Host: localhost\r\n\r\n")
            .build();

        let line = read_request_line(&mut stream, DEFAULT_READ_TIMEOUT).await.unwrap();
        assert_eq!(line.path, "/health/readiness");
    }

    #[tokio::test]
    async fn test_read_stops_at_bare_lf_blank_line() {
        // The wait would outlast the timeout if the blank line went unnoticed
        let mut stream = Builder::new()
            .read(b"GET /health/liveness HTTP/1.0\nHost: probe\n\n")
            .wait(Duration::from_secs(5))
            .build();

        let started = std::time::Instant::now();
        let line = read_request_line(&mut stream, Duration::from_secs(2)).await.unwrap();
        assert_eq!(line.path, "/health/liveness");
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_read_stops_at_end_of_stream() {
        let mut stream = Builder::new().read(b"GET /health/status").build();

        let line = read_request_line(&mut stream, DEFAULT_READ_TIMEOUT).await.unwrap();
        assert_eq!(line.path, "/health/status");
    }

    #[tokio::test]
    async fn test_read_timeout_uses_partial_head() {
        let mut stream = Builder::new()
            .read(b"GET /health/liveness HTTP/1.1\r\n")
            .wait(Duration::from_secs(2))
            .build();

        let line = read_request_line(&mut stream, Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(line.path, "/health/liveness");
    }

    #[tokio::test]
    async fn test_read_io_error() {
        let mut stream = Builder::new()
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();

        assert!(matches!(
            read_request_line(&mut stream, DEFAULT_READ_TIMEOUT).await,
            Err(RequestError::Io(_))
        ));
    }
}
