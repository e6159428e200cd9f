//! # websock: RFC 6455 WebSocket server handshake and frame codec
//!
//! This crate implements the server side of the WebSocket protocol:
//! the HTTP upgrade handshake and the binary frame encoder. It is meant
//! to be driven by an external accept loop: the crate upgrades an
//! accepted stream into a WebSocket session and serializes outgoing
//! frames (text, binary, close, ping, pong) onto it.
//!
//! The codec emits single, unfragmented frames only: large messages rely
//! on the 64-bit length tier rather than continuation frames. Incoming
//! message demultiplexing and fragment reassembly are intentionally not
//! provided; [`frame::parse_header`] exists for peer-side verification.
//!
//! ## Example
//!
//! ```ignore
//! use tokio::net::TcpListener;
//! use websock::{Config, WsServer};
//!
//! let listener = TcpListener::bind("0.0.0.0:8000").await?;
//! let server = WsServer::new(Config::default());
//!
//! server.serve(listener, |mut conn, info| async move {
//!     conn.send_text("Hello! Thanks for connecting!\n", Default::default(), 0)
//!         .await
//!         .ok();
//! }).await?;
//! ```

pub mod connection;
pub mod error;
pub mod frame;
pub mod handshake;
pub mod mask;
pub mod registry;
pub mod server;

pub use connection::WsConnection;
pub use error::{Error, Result};
pub use frame::{Flags, OpCode};
pub use handshake::HandshakeComplete;
pub use registry::{ClientId, ClientRegistry};
pub use server::{ConnectionInfo, WsServer};

/// WebSocket protocol version advertised by clients in `Sec-WebSocket-Version`
pub const PROTOCOL_VERSION: u32 = 13;

/// WebSocket GUID for handshake accept-key derivation (RFC 6455 §1.3)
pub const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Largest payload that fits the 7-bit length field (2-byte header)
pub const SMALL_MESSAGE_THRESHOLD: usize = 125;

/// Largest payload that fits the 16-bit length field (4-byte header)
pub const MEDIUM_MESSAGE_THRESHOLD: usize = 65535;

/// Maximum WebSocket frame header size (2 + 8 + 4 = 14 bytes)
pub const MAX_FRAME_HEADER_SIZE: usize = 14;

/// Default cap on the HTTP upgrade request (8KB covers any reasonable request)
pub const DEFAULT_MAX_HEADER_SIZE: usize = 8192;

/// Default number of concurrent client slots in the registry
pub const DEFAULT_MAX_CLIENTS: usize = 32;

/// Configuration for the WebSocket server
///
/// # Example
///
/// ```
/// use websock::Config;
///
/// let config = Config::builder()
///     .max_header_size(16 * 1024)
///     .max_clients(64)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum size of the HTTP upgrade request in bytes (default: 8KB).
    /// A handshake that exceeds this without completing its header block
    /// is rejected.
    pub max_header_size: usize,
    /// Maximum number of concurrently registered clients (default: 32).
    /// Connections past the limit get a close frame and are dropped.
    pub max_clients: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            max_clients: DEFAULT_MAX_CLIENTS,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for server configuration
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Set the maximum HTTP upgrade request size
    pub fn max_header_size(mut self, bytes: usize) -> Self {
        self.config.max_header_size = bytes;
        self
    }

    /// Set the maximum number of registered clients
    pub fn max_clients(mut self, count: usize) -> Self {
        self.config.max_clients = count;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Config {
        self.config
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::Config;
    pub use crate::connection::WsConnection;
    pub use crate::error::{Error, Result};
    pub use crate::frame::{Flags, OpCode};
    pub use crate::server::WsServer;
}
