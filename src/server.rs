//! WebSocket accept loop
//!
//! [`WsServer`] couples the handshake negotiator with a connection
//! source: the listener produces connections, a supplied handler is
//! invoked for each successful upgrade. Each connection runs in its
//! own task, so the execution model can be swapped without touching
//! the protocol core. [`WsServer::accept`] upgrades a single stream
//! for callers that bring their own loop.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};

use crate::connection::WsConnection;
use crate::error::{Error, Result};
use crate::frame::Flags;
use crate::handshake::{self, HandshakeComplete};
use crate::registry::{ClientId, ClientRegistry};
use crate::Config;

/// Per-connection context passed to the handler.
#[derive(Debug)]
pub struct ConnectionInfo {
    /// Request path from the upgrade request
    pub path: String,
    /// Peer address of the accepted connection
    pub peer: SocketAddr,
    /// Registry slot held for the lifetime of the handler
    pub client_id: ClientId,
    /// Bytes the peer sent past the header block, if any (the start
    /// of its first frame)
    pub leftover: Option<Bytes>,
}

/// WebSocket server: handshake negotiation plus client bookkeeping.
pub struct WsServer {
    config: Config,
    registry: Arc<ClientRegistry>,
}

impl WsServer {
    /// Create a server with the given configuration.
    pub fn new(config: Config) -> Self {
        let registry = Arc::new(ClientRegistry::new(config.max_clients));
        Self { config, registry }
    }

    /// Server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The client registry, shared with connection tasks.
    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Upgrade a single accepted stream.
    ///
    /// Performs the handshake and wraps the stream on success. Does
    /// not touch the registry; `serve` layers that on top.
    pub async fn accept<S>(&self, mut stream: S) -> Result<(WsConnection<S>, HandshakeComplete)>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let complete = handshake::server_handshake(&mut stream, self.config.max_header_size).await?;
        Ok((WsConnection::new(stream), complete))
    }

    /// Accept connections from `listener` and invoke `handler` for
    /// each successful upgrade.
    ///
    /// Per connection: handshake, registry slot claim, handler, slot
    /// release. A failed handshake is logged and the connection
    /// dropped with nothing written to the peer. When the registry is
    /// full the server sends an empty close frame and drops the
    /// connection.
    pub async fn serve<F, Fut>(&self, listener: TcpListener, handler: F) -> Result<()>
    where
        F: Fn(WsConnection<TcpStream>, ConnectionInfo) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        loop {
            let (stream, peer) = listener.accept().await.map_err(Error::Io)?;
            stream.set_nodelay(true).ok();

            let handler = handler.clone();
            let registry = Arc::clone(&self.registry);
            let max_header_size = self.config.max_header_size;

            tokio::spawn(async move {
                handle_connection(stream, peer, max_header_size, registry, handler).await;
            });
        }
    }
}

impl Default for WsServer {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

async fn handle_connection<F, Fut>(
    mut stream: TcpStream,
    peer: SocketAddr,
    max_header_size: usize,
    registry: Arc<ClientRegistry>,
    handler: F,
) where
    F: Fn(WsConnection<TcpStream>, ConnectionInfo) -> Fut,
    Fut: Future<Output = ()>,
{
    let complete = match handshake::server_handshake(&mut stream, max_header_size).await {
        Ok(complete) => complete,
        Err(e) => {
            tracing::warn!(%peer, error = %e, "websocket handshake failed");
            return;
        }
    };

    tracing::info!(%peer, path = %complete.path, "websocket client connected");

    let mut conn = WsConnection::new(stream);

    let Some(client_id) = registry.register(peer) else {
        tracing::warn!(%peer, "client limit reached, closing connection");
        conn.send_close(Flags::default(), 0).await.ok();
        return;
    };

    let info = ConnectionInfo {
        path: complete.path,
        peer,
        client_id,
        leftover: complete.leftover,
    };

    handler(conn, info).await;

    registry.release(client_id);
    tracing::debug!(%peer, "websocket client released");
}
