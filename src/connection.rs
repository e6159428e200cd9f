//! Post-handshake send surface
//!
//! [`WsConnection`] wraps a negotiated stream and turns logical
//! messages into RFC 6455 frames on the wire. Every helper emits one
//! complete, final frame; a write error means the frame was not sent
//! and no retry is attempted here.

use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::Result;
use crate::frame::{encode_frame, Flags, OpCode};
use crate::MAX_FRAME_HEADER_SIZE;

/// A WebSocket connection after a successful handshake.
///
/// Owns the underlying stream; reading raw bytes back out goes through
/// [`WsConnection::get_mut`] or [`WsConnection::into_inner`].
#[derive(Debug)]
pub struct WsConnection<S> {
    stream: S,
    write_buf: BytesMut,
}

impl<S> WsConnection<S> {
    /// Wrap a stream that has already completed the upgrade handshake.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            write_buf: BytesMut::with_capacity(MAX_FRAME_HEADER_SIZE + 128),
        }
    }

    /// Get a shared reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Get a mutable reference to the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Consume the connection, returning the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: AsyncWrite + Unpin> WsConnection<S> {
    /// Encode and transmit a single frame.
    ///
    /// The payload is masked when `masking_key` is non-zero or
    /// [`Flags::MASK`] is set. Servers must pass `0`: RFC 6455 §5.1
    /// forbids masking in the server-to-client direction.
    pub async fn send(
        &mut self,
        opcode: OpCode,
        payload: &[u8],
        flags: Flags,
        masking_key: u32,
    ) -> Result<()> {
        self.write_buf.clear();
        encode_frame(&mut self.write_buf, opcode, payload, flags, masking_key);
        self.stream.write_all(&self.write_buf).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Send a text frame.
    ///
    /// The bytes of `text` go out as-is; `&str` guarantees valid UTF-8.
    pub async fn send_text(&mut self, text: &str, flags: Flags, masking_key: u32) -> Result<()> {
        self.send(OpCode::Text, text.as_bytes(), flags, masking_key)
            .await
    }

    /// Send a binary frame.
    pub async fn send_binary(&mut self, data: &[u8], flags: Flags, masking_key: u32) -> Result<()> {
        self.send(OpCode::Binary, data, flags, masking_key).await
    }

    /// Send a close frame with an empty body.
    ///
    /// Callers that need a status code and reason in the close payload
    /// build it themselves and use [`WsConnection::send`].
    pub async fn send_close(&mut self, flags: Flags, masking_key: u32) -> Result<()> {
        self.send(OpCode::Close, &[], flags, masking_key).await
    }

    /// Send a ping frame with an empty body.
    pub async fn send_ping(&mut self, flags: Flags, masking_key: u32) -> Result<()> {
        self.send(OpCode::Ping, &[], flags, masking_key).await
    }

    /// Send a pong frame with an empty body.
    pub async fn send_pong(&mut self, flags: Flags, masking_key: u32) -> Result<()> {
        self.send(OpCode::Pong, &[], flags, masking_key).await
    }
}
