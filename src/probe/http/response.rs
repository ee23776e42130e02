//! Literal HTTP/1.1 probe responses.

/// A probe response. Every response closes the connection after it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResponse {
    /// 200 with an empty body.
    Ok,
    /// 503 with an empty body.
    ServiceUnavailable,
    /// 404 with an empty body.
    NotFound,
    /// 405 with an empty body.
    MethodNotAllowed,
    /// 200 with a JSON body.
    Json(String),
}

impl ProbeResponse {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Ok | Self::Json(_) => 200,
            Self::ServiceUnavailable => 503,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
        }
    }

    fn status_line(&self) -> &'static str {
        match self {
            Self::Ok | Self::Json(_) => "HTTP/1.1 200 OK",
            Self::ServiceUnavailable => "HTTP/1.1 503 Service Unavailable",
            Self::NotFound => "HTTP/1.1 404 Not Found",
            Self::MethodNotAllowed => "HTTP/1.1 405 Method Not Allowed",
        }
    }

    /// Wire bytes: status line, `Content-Length`, `Content-Type` only when a
    /// body is present, blank line, body.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Json(body) => format!(
                "{}\r\nContent-Length: {}\r\nContent-Type: application/json\r\n\r\n{}",
                self.status_line(),
                body.len(),
                body
            )
            .into_bytes(),
            _ => format!("{}\r\nContent-Length: 0\r\n\r\n", self.status_line()).into_bytes(),
        }
    }
}
