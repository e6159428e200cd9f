//! Error types for handshake negotiation and frame transmission

use std::fmt;
use std::io;

/// Result type alias for WebSocket operations
pub type Result<T> = std::result::Result<T, Error>;

/// WebSocket error types
///
/// Every handshake validation failure has its own variant so callers can
/// handle rejections exhaustively instead of inspecting message strings.
/// The first failure aborts the handshake; nothing is written to the peer
/// once an error is detected.
#[derive(Debug)]
pub enum Error {
    /// I/O error from the underlying stream
    Io(io::Error),
    /// Connection read did not yield a complete HTTP header block
    RecvHttpHeaders,
    /// Malformed HTTP request line or header
    HttpRequest(&'static str),
    /// Request method is not GET
    HttpMethod,
    /// HTTP version unparseable or below 1.1
    HttpVersion,
    /// Missing or mismatched Sec-WebSocket-Version header
    WebsocketVersion,
    /// Missing or invalid Upgrade header
    NoUpgrade,
    /// Missing or empty Sec-WebSocket-Key header
    NoKey,
    /// Invalid WebSocket frame header
    InvalidFrame(&'static str),
    /// Connection closed by the peer
    ConnectionClosed,
    /// Would block (non-blocking I/O)
    WouldBlock,
    /// Connection reset by peer
    ConnectionReset,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::RecvHttpHeaders => write!(f, "could not receive HTTP headers"),
            Error::HttpRequest(msg) => write!(f, "invalid HTTP request: {}", msg),
            Error::HttpMethod => write!(f, "HTTP method must be GET"),
            Error::HttpVersion => write!(f, "unsupported HTTP version"),
            Error::WebsocketVersion => write!(f, "unsupported WebSocket version"),
            Error::NoUpgrade => write!(f, "missing Upgrade: websocket header"),
            Error::NoKey => write!(f, "missing Sec-WebSocket-Key header"),
            Error::InvalidFrame(msg) => write!(f, "invalid frame: {}", msg),
            Error::ConnectionClosed => write!(f, "connection closed"),
            Error::WouldBlock => write!(f, "would block"),
            Error::ConnectionReset => write!(f, "connection reset by peer"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::WouldBlock => Error::WouldBlock,
            io::ErrorKind::ConnectionReset => Error::ConnectionReset,
            io::ErrorKind::BrokenPipe => Error::ConnectionClosed,
            io::ErrorKind::UnexpectedEof => Error::ConnectionClosed,
            _ => Error::Io(e),
        }
    }
}
