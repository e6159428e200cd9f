//! WebSocket upgrade handshake (server side)
//!
//! Parses the client's HTTP upgrade request, derives the
//! `Sec-WebSocket-Accept` token (Base64 of SHA-1 over key + GUID) and
//! emits the `101 Switching Protocols` response.
//!
//! Validation runs in a fixed order: method, HTTP version, `Upgrade`
//! header, `Sec-WebSocket-Version`, `Sec-WebSocket-Key`. The first
//! failed check aborts the handshake and nothing is written to the
//! peer.

use base64::Engine;
use bytes::{BufMut, Bytes, BytesMut};
use sha1::{Digest, Sha1};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::{PROTOCOL_VERSION, WS_GUID};

/// A validated WebSocket upgrade request
///
/// Borrows from the input buffer; lives only as long as the handshake.
#[derive(Debug)]
pub struct ConnectRequest<'a> {
    /// The request path
    pub path: &'a str,
    /// The Host header
    pub host: Option<&'a str>,
    /// The Sec-WebSocket-Key header value (opaque token)
    pub key: &'a str,
}

/// Parse and validate a WebSocket upgrade request.
///
/// Returns the request and the number of bytes consumed, or `Ok(None)`
/// when the buffer does not yet contain a complete header block (the
/// caller keeps reading). Parsing is stateless: the same bytes always
/// yield the same result.
pub fn parse_connect_request(buf: &[u8]) -> Result<Option<(ConnectRequest<'_>, usize)>> {
    let mut headers = [httparse::EMPTY_HEADER; 32];
    let mut req = httparse::Request::new(&mut headers);

    let len = match req.parse(buf) {
        Ok(httparse::Status::Complete(len)) => len,
        Ok(httparse::Status::Partial) => return Ok(None),
        Err(httparse::Error::Version) => return Err(Error::HttpVersion),
        Err(_) => return Err(Error::HttpRequest("malformed request line or header")),
    };

    if req.method != Some("GET") {
        return Err(Error::HttpMethod);
    }

    // httparse only admits HTTP/1.x; minor version 1 means 1.1
    if req.version != Some(1) {
        return Err(Error::HttpVersion);
    }

    let mut key = None;
    let mut ws_version = None;
    let mut host = None;
    let mut upgrade = false;

    for header in req.headers.iter() {
        let name = header.name.to_ascii_lowercase();
        let value = std::str::from_utf8(header.value)
            .map_err(|_| Error::HttpRequest("invalid header value"))?
            .trim();

        match name.as_str() {
            "sec-websocket-key" => key = Some(value),
            "sec-websocket-version" => ws_version = Some(value),
            "host" => host = Some(value),
            "upgrade" => {
                if value.to_ascii_lowercase().contains("websocket") {
                    upgrade = true;
                }
            }
            _ => {}
        }
    }

    if !upgrade {
        return Err(Error::NoUpgrade);
    }

    // Exact version match, not a range check
    match ws_version.and_then(|v| v.parse::<u32>().ok()) {
        Some(v) if v == PROTOCOL_VERSION => {}
        _ => return Err(Error::WebsocketVersion),
    }

    let key = match key {
        Some(k) if !k.is_empty() => k,
        _ => return Err(Error::NoKey),
    };

    let path = req.path.unwrap_or("/");

    Ok(Some((ConnectRequest { path, host, key }, len)))
}

/// Derive the `Sec-WebSocket-Accept` token: Base64(SHA-1(key + GUID)).
///
/// Deterministic; the handshake's entropy lives entirely in the
/// client-chosen key.
#[inline]
pub fn derive_accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WS_GUID.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
}

/// Build the `101 Switching Protocols` response bytes.
pub fn build_accept_response(accept_key: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(128);

    buf.put_slice(b"HTTP/1.1 101 Switching Protocols\r\n");
    buf.put_slice(b"Upgrade: websocket\r\n");
    buf.put_slice(b"Connection: Upgrade\r\n");
    buf.put_slice(b"Sec-WebSocket-Accept: ");
    buf.put_slice(accept_key.as_bytes());
    buf.put_slice(b"\r\n\r\n");
    buf.freeze()
}

/// Result of a successful server handshake
#[derive(Debug)]
pub struct HandshakeComplete {
    /// The request path
    pub path: String,
    /// Bytes read past the end of the header block, if any. These are
    /// the start of the peer's first frame and must not be discarded.
    pub leftover: Option<Bytes>,
}

/// Perform the server-side handshake on `stream`.
///
/// Reads until a full header block arrives, validates it, and writes
/// the 101 response. Atomic from the caller's view: either the
/// response goes out or nothing is written and the first error comes
/// back. A header block that ends early (EOF) or exceeds
/// `max_header_size` fails with [`Error::RecvHttpHeaders`].
///
/// The caller owns closing the stream on failure.
pub async fn server_handshake<S>(stream: &mut S, max_header_size: usize) -> Result<HandshakeComplete>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = BytesMut::with_capacity(1024);

    loop {
        let n = stream.read_buf(&mut buf).await?;
        if n == 0 {
            return Err(Error::RecvHttpHeaders);
        }

        if let Some((req, consumed)) = parse_connect_request(&buf)? {
            let accept_key = derive_accept_key(req.key);
            let path = req.path.to_string();

            let response = build_accept_response(&accept_key);
            stream.write_all(&response).await?;
            stream.flush().await?;

            let leftover = if consumed < buf.len() {
                Some(buf.split_off(consumed).freeze())
            } else {
                None
            };

            return Ok(HandshakeComplete { path, leftover });
        }

        if buf.len() > max_header_size {
            return Err(Error::RecvHttpHeaders);
        }
    }
}
