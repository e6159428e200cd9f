//! WebSocket frame encoding (RFC 6455 §5.2)
//!
//! The encoder always emits complete, single frames: FIN is set by
//! default and no continuation logic exists. Fragmented output would
//! change wire compatibility expectations, so large messages rely on
//! the 64-bit length tier instead.
//!
//! [`parse_header`] decodes a frame header from a complete buffer. It
//! backs the round-trip tests and peer-side verification; streaming
//! message reassembly is out of scope for this crate.

use std::ops::{BitOr, BitOrAssign};

use bytes::{BufMut, BytesMut};

use crate::error::{Error, Result};
use crate::mask::{apply_mask, mask_bytes};
use crate::{MEDIUM_MESSAGE_THRESHOLD, SMALL_MESSAGE_THRESHOLD};

/// WebSocket opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Continuation frame
    Continuation = 0x0,
    /// Text frame
    Text = 0x1,
    /// Binary frame
    Binary = 0x2,
    /// Connection close
    Close = 0x8,
    /// Ping
    Ping = 0x9,
    /// Pong
    Pong = 0xA,
}

impl OpCode {
    /// Parse opcode from byte; all other nibbles are reserved
    #[inline]
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x0 => Some(OpCode::Continuation),
            0x1 => Some(OpCode::Text),
            0x2 => Some(OpCode::Binary),
            0x8 => Some(OpCode::Close),
            0x9 => Some(OpCode::Ping),
            0xA => Some(OpCode::Pong),
            _ => None,
        }
    }

    /// Check if this is a control frame
    #[inline]
    pub fn is_control(&self) -> bool {
        (*self as u8) >= 0x8
    }

    /// Check if this is a data frame
    #[inline]
    pub fn is_data(&self) -> bool {
        (*self as u8) <= 0x2
    }
}

/// Frame flag bits
///
/// The bit positions mirror the first two wire bytes viewed as a
/// big-endian u16: FIN and the RSV bits live in the high byte, the
/// MASK bit in the low byte. [`Flags::default`] is FIN alone; this
/// codec only ever emits final frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags(u16);

impl Flags {
    /// No flags set (emits a non-final frame; the codec never follows
    /// up with a continuation, so prefer the default)
    pub const NONE: Flags = Flags(0);
    /// Final fragment of a message
    pub const FIN: Flags = Flags(1 << 15);
    /// Reserved bit 1 (extensions only)
    pub const RSV1: Flags = Flags(1 << 14);
    /// Reserved bit 2 (extensions only)
    pub const RSV2: Flags = Flags(1 << 13);
    /// Reserved bit 3 (extensions only)
    pub const RSV3: Flags = Flags(1 << 12);
    /// Mask the payload even when the masking key is zero
    pub const MASK: Flags = Flags(1 << 7);

    /// Raw bit representation
    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Check whether all bits of `other` are set
    #[inline]
    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for Flags {
    #[inline]
    fn default() -> Self {
        Flags::FIN
    }
}

impl BitOr for Flags {
    type Output = Flags;

    #[inline]
    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

/// A parsed WebSocket frame header
#[derive(Debug, Clone)]
pub struct FrameHeader {
    /// Final fragment flag
    pub fin: bool,
    /// RSV1 (extensions only)
    pub rsv1: bool,
    /// RSV2 (reserved)
    pub rsv2: bool,
    /// RSV3 (reserved)
    pub rsv3: bool,
    /// Frame opcode
    pub opcode: OpCode,
    /// Mask flag
    pub masked: bool,
    /// Payload length
    pub payload_len: u64,
    /// Masking key bytes (if masked)
    pub mask: Option<[u8; 4]>,
}

/// Encode a complete WebSocket frame into `buf`.
///
/// The payload is masked when `masking_key` is non-zero or
/// [`Flags::MASK`] is set; the 4 key bytes go out in network byte
/// order and each payload byte is XORed with `key[i mod 4]`. The
/// length field always uses the smallest tier that fits.
///
/// RFC 6455 §5.1 forbids servers from masking frames sent to clients;
/// server-side callers pass `0`. The parameter exists for symmetry and
/// for exercising the unmask path in tests.
pub fn encode_frame(
    buf: &mut BytesMut,
    opcode: OpCode,
    payload: &[u8],
    flags: Flags,
    masking_key: u32,
) {
    let payload_len = payload.len();
    let masked = masking_key != 0 || flags.contains(Flags::MASK);

    let header_size = 2
        + if payload_len > MEDIUM_MESSAGE_THRESHOLD {
            8
        } else if payload_len > SMALL_MESSAGE_THRESHOLD {
            2
        } else {
            0
        }
        + if masked { 4 } else { 0 };

    buf.reserve(header_size + payload_len);

    // First byte: FIN + RSV1-3 from the high flag byte, opcode nibble
    buf.put_u8(((flags.bits() >> 8) as u8 & 0xF0) | (opcode as u8 & 0x0F));

    // Second byte: mask flag + length tier
    let mask_bit = if masked { 0x80 } else { 0x00 };

    if payload_len <= SMALL_MESSAGE_THRESHOLD {
        buf.put_u8(mask_bit | payload_len as u8);
    } else if payload_len <= MEDIUM_MESSAGE_THRESHOLD {
        buf.put_u8(mask_bit | 126);
        buf.put_u16(payload_len as u16);
    } else {
        buf.put_u8(mask_bit | 127);
        buf.put_u64(payload_len as u64);
    }

    if masked {
        let key = mask_bytes(masking_key);
        buf.put_slice(&key);

        let start = buf.len();
        buf.put_slice(payload);
        apply_mask(&mut buf[start..], key);
    } else {
        buf.put_slice(payload);
    }
}

/// Parse a frame header from the start of `buf`.
///
/// Returns the header and its size in bytes, or `Ok(None)` if the
/// buffer does not yet hold a complete header. Rejects reserved
/// opcodes and non-minimal length encodings.
pub fn parse_header(buf: &[u8]) -> Result<Option<(FrameHeader, usize)>> {
    if buf.len() < 2 {
        return Ok(None);
    }

    let b0 = buf[0];
    let b1 = buf[1];

    let fin = b0 & 0x80 != 0;
    let rsv1 = b0 & 0x40 != 0;
    let rsv2 = b0 & 0x20 != 0;
    let rsv3 = b0 & 0x10 != 0;
    let opcode = OpCode::from_u8(b0 & 0x0F).ok_or(Error::InvalidFrame("invalid opcode"))?;

    let masked = b1 & 0x80 != 0;
    let len_byte = b1 & 0x7F;

    let (payload_len, len_end) = if len_byte <= 125 {
        (len_byte as u64, 2)
    } else if len_byte == 126 {
        if buf.len() < 4 {
            return Ok(None);
        }
        let len = u16::from_be_bytes([buf[2], buf[3]]) as u64;
        if len < 126 {
            return Err(Error::InvalidFrame("payload length not minimal"));
        }
        (len, 4)
    } else {
        if buf.len() < 10 {
            return Ok(None);
        }
        let len = u64::from_be_bytes([
            buf[2], buf[3], buf[4], buf[5], buf[6], buf[7], buf[8], buf[9],
        ]);
        if len <= 0xFFFF {
            return Err(Error::InvalidFrame("payload length not minimal"));
        }
        if len >> 63 != 0 {
            return Err(Error::InvalidFrame("payload length MSB must be 0"));
        }
        (len, 10)
    };

    if opcode.is_control() && payload_len > 125 {
        return Err(Error::InvalidFrame("control frame too large"));
    }

    let header_size = len_end + if masked { 4 } else { 0 };
    if buf.len() < header_size {
        return Ok(None);
    }

    let mask = masked.then(|| [buf[len_end], buf[len_end + 1], buf[len_end + 2], buf[len_end + 3]]);

    Ok(Some((
        FrameHeader {
            fin,
            rsv1,
            rsv2,
            rsv3,
            opcode,
            masked,
            payload_len,
            mask,
        },
        header_size,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_classes() {
        assert!(OpCode::Ping.is_control());
        assert!(OpCode::Pong.is_control());
        assert!(OpCode::Close.is_control());
        assert!(!OpCode::Text.is_control());
        assert!(OpCode::Text.is_data());
        assert!(OpCode::Binary.is_data());
        assert!(OpCode::Continuation.is_data());
        assert!(OpCode::from_u8(0x3).is_none());
        assert!(OpCode::from_u8(0xF).is_none());
    }

    #[test]
    fn default_flags_are_final() {
        assert!(Flags::default().contains(Flags::FIN));
        assert!(!Flags::default().contains(Flags::MASK));

        let flags = Flags::FIN | Flags::RSV1;
        assert!(flags.contains(Flags::FIN));
        assert!(flags.contains(Flags::RSV1));
        assert!(!flags.contains(Flags::RSV2));
    }

    #[test]
    fn encode_small_text() {
        let mut buf = BytesMut::new();
        encode_frame(&mut buf, OpCode::Text, b"hello", Flags::default(), 0);

        assert_eq!(buf[0], 0x81); // FIN + Text
        assert_eq!(buf[1], 0x05); // unmasked, length 5
        assert_eq!(&buf[2..], b"hello");
    }

    #[test]
    fn encode_without_fin() {
        let mut buf = BytesMut::new();
        encode_frame(&mut buf, OpCode::Binary, b"x", Flags::NONE, 0);
        assert_eq!(buf[0], 0x02);
    }

    #[test]
    fn encode_rsv_bits() {
        let mut buf = BytesMut::new();
        encode_frame(
            &mut buf,
            OpCode::Text,
            b"",
            Flags::FIN | Flags::RSV1 | Flags::RSV3,
            0,
        );
        assert_eq!(buf[0], 0x80 | 0x40 | 0x10 | 0x01);
    }

    #[test]
    fn encode_masked_key_in_network_order() {
        let mut buf = BytesMut::new();
        encode_frame(&mut buf, OpCode::Text, b"test", Flags::default(), 0x01020304);

        assert_eq!(buf[0], 0x81);
        assert_eq!(buf[1], 0x84); // masked, length 4
        assert_eq!(&buf[2..6], &[0x01, 0x02, 0x03, 0x04]);

        let mut payload = buf[6..].to_vec();
        apply_mask(&mut payload, [0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&payload, b"test");
    }

    #[test]
    fn mask_flag_without_key_still_masks() {
        let mut buf = BytesMut::new();
        encode_frame(&mut buf, OpCode::Text, b"abc", Flags::FIN | Flags::MASK, 0);

        assert_eq!(buf[1], 0x83); // mask bit set
        assert_eq!(&buf[2..6], &[0, 0, 0, 0]);
        // Zero key: masking is the identity transform
        assert_eq!(&buf[6..], b"abc");
    }

    #[test]
    fn length_tier_is_minimal() {
        let cases: &[(usize, u8, usize)] = &[
            (0, 0, 2),
            (1, 1, 3),
            (125, 125, 127),
            (126, 126, 130),
            (127, 126, 131),
            (65535, 126, 65539),
            (65536, 127, 65546),
        ];
        for &(len, expected_marker, expected_total) in cases {
            let payload = vec![0xAB; len];
            let mut buf = BytesMut::new();
            encode_frame(&mut buf, OpCode::Binary, &payload, Flags::default(), 0);

            assert_eq!(buf[1] & 0x7F, expected_marker, "len {}", len);
            assert_eq!(buf.len(), expected_total, "len {}", len);
        }
    }

    #[test]
    fn round_trip_all_tiers() {
        let key = 0x37FA213Du32;
        for len in [0usize, 1, 125, 126, 127, 65535, 65536] {
            let payload: Vec<u8> = (0..len as u32).map(|i| (i % 251) as u8).collect();
            let mut buf = BytesMut::new();
            encode_frame(&mut buf, OpCode::Binary, &payload, Flags::default(), key);

            let (header, header_size) = parse_header(&buf).unwrap().unwrap();
            assert!(header.fin);
            assert_eq!(header.opcode, OpCode::Binary);
            assert_eq!(header.payload_len, len as u64);
            assert_eq!(header.mask, Some(mask_bytes(key)));
            assert_eq!(buf.len(), header_size + len);

            let mut recovered = buf[header_size..].to_vec();
            apply_mask(&mut recovered, header.mask.unwrap());
            assert_eq!(recovered, payload, "len {}", len);
        }
    }

    #[test]
    fn round_trip_control_opcodes() {
        for opcode in [OpCode::Close, OpCode::Ping, OpCode::Pong] {
            let mut buf = BytesMut::new();
            encode_frame(&mut buf, opcode, b"ok", Flags::default(), 0);

            let (header, header_size) = parse_header(&buf).unwrap().unwrap();
            assert_eq!(header.opcode, opcode);
            assert!(!header.masked);
            assert_eq!(&buf[header_size..], b"ok");
        }
    }

    #[test]
    fn parse_incomplete_header() {
        assert!(parse_header(&[0x81]).unwrap().is_none());
        // 16-bit tier announced, length bytes missing
        assert!(parse_header(&[0x81, 126]).unwrap().is_none());
        // masked, key bytes missing
        assert!(parse_header(&[0x81, 0x85, 0x01, 0x02]).unwrap().is_none());
    }

    #[test]
    fn parse_rejects_reserved_opcode() {
        assert!(matches!(
            parse_header(&[0x83, 0x00]),
            Err(Error::InvalidFrame(_))
        ));
    }

    #[test]
    fn parse_rejects_non_minimal_length() {
        // 16-bit tier carrying a value that fits in 7 bits
        let buf = [0x82, 126, 0x00, 0x05];
        assert!(matches!(
            parse_header(&buf),
            Err(Error::InvalidFrame("payload length not minimal"))
        ));

        // 64-bit tier carrying a value that fits in 16 bits
        let mut buf = vec![0x82, 127];
        buf.extend_from_slice(&1000u64.to_be_bytes());
        assert!(matches!(
            parse_header(&buf),
            Err(Error::InvalidFrame("payload length not minimal"))
        ));
    }
}
