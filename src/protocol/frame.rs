//! Frame header encoding and decoding (RFC 6455 Section 5.2).
//!
//! Decoding is split into steps that each consume a fixed number of bytes,
//! so a stream reader never has to look further ahead than the next field:
//!
//! 1. [`decode_first_byte`]: FIN and opcode.
//! 2. [`decode_second_byte`]: MASK bit and the 7-bit length indicator.
//! 3. [`LengthField::decode`]: 0, 2 or 8 extended length bytes.
//! 4. Optional 4-byte masking key, then the payload.
//!
//! [`parse_header`] chains the same steps over an in-memory buffer.

use bytes::{BufMut, BytesMut};

use crate::error::{Error, Result};
use crate::protocol::OpCode;
use crate::protocol::mask::apply_mask_fast;

/// Maximum payload size for control frames.
pub const MAX_CONTROL_FRAME_PAYLOAD: usize = 125;

const FIN_BIT: u8 = 0x80;
const RSV_BITS: u8 = 0x70;
const OPCODE_BITS: u8 = 0x0F;
const MASK_BIT: u8 = 0x80;
const LEN_BITS: u8 = 0x7F;

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Last frame of a message.
    pub fin: bool,
    /// Frame opcode.
    pub opcode: OpCode,
    /// Payload length in bytes.
    pub payload_len: u64,
    /// Masking key, present iff the MASK bit is set.
    pub mask: Option<[u8; 4]>,
}

impl FrameHeader {
    /// Header for a frame of `payload_len` bytes.
    #[must_use]
    pub const fn new(fin: bool, opcode: OpCode, payload_len: u64, mask: Option<[u8; 4]>) -> Self {
        Self {
            fin,
            opcode,
            payload_len,
            mask,
        }
    }

    /// Whether the MASK bit is set.
    #[must_use]
    pub const fn is_masked(&self) -> bool {
        self.mask.is_some()
    }

    /// Number of bytes this header occupies on the wire.
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        let mask_len = if self.mask.is_some() { 4 } else { 0 };
        2 + LengthField::for_len(self.payload_len).extra_bytes() + mask_len
    }

    /// Append the header bytes to `dst`, using the shortest length form.
    pub fn encode(&self, dst: &mut BytesMut) {
        let mut byte0 = self.opcode.as_u8();
        if self.fin {
            byte0 |= FIN_BIT;
        }
        let mask_bit = if self.mask.is_some() { MASK_BIT } else { 0 };

        dst.reserve(self.encoded_len());
        dst.put_u8(byte0);
        match LengthField::for_len(self.payload_len) {
            LengthField::Inline(len) => dst.put_u8(len | mask_bit),
            LengthField::Extended16 => {
                dst.put_u8(126 | mask_bit);
                dst.put_u16(self.payload_len as u16);
            }
            LengthField::Extended64 => {
                dst.put_u8(127 | mask_bit);
                dst.put_u64(self.payload_len);
            }
        }
        if let Some(key) = self.mask {
            dst.put_slice(&key);
        }
    }
}

/// A received frame with its payload already unmasked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Last frame of a message.
    pub fin: bool,
    /// Frame opcode.
    pub opcode: OpCode,
    /// Payload bytes.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Payload, or `None` if it is empty.
    #[must_use]
    pub fn into_optional_payload(self) -> Option<Vec<u8>> {
        if self.payload.is_empty() {
            None
        } else {
            Some(self.payload)
        }
    }
}

/// Encode one complete frame into `dst`.
///
/// With a masking key the payload is written XORed against it; without one
/// it is written unchanged.
pub fn encode_frame(
    dst: &mut BytesMut,
    fin: bool,
    opcode: OpCode,
    payload: &[u8],
    mask: Option<[u8; 4]>,
) {
    let header = FrameHeader::new(fin, opcode, payload.len() as u64, mask);
    dst.reserve(header.encoded_len() + payload.len());
    header.encode(dst);

    let start = dst.len();
    dst.put_slice(payload);
    if let Some(key) = mask {
        apply_mask_fast(&mut dst[start..], key);
    }
}

/// How the payload length is carried after the second header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthField {
    /// 0..=125, no extra bytes.
    Inline(u8),
    /// Indicator 126: 2-byte big-endian length follows.
    Extended16,
    /// Indicator 127: 8-byte big-endian length follows.
    Extended64,
}

impl LengthField {
    /// Minimal representation for `len`.
    #[must_use]
    pub const fn for_len(len: u64) -> Self {
        if len <= 125 {
            LengthField::Inline(len as u8)
        } else if len <= 0xFFFF {
            LengthField::Extended16
        } else {
            LengthField::Extended64
        }
    }

    /// Number of extended length bytes that follow.
    #[must_use]
    pub const fn extra_bytes(self) -> usize {
        match self {
            LengthField::Inline(_) => 0,
            LengthField::Extended16 => 2,
            LengthField::Extended64 => 8,
        }
    }

    /// Resolve the payload length from the extended bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProtocolViolation`] if `extended` has the wrong size
    /// or a 64-bit length has its most significant bit set.
    pub fn decode(self, extended: &[u8]) -> Result<u64> {
        match (self, extended) {
            (LengthField::Inline(len), []) => Ok(u64::from(len)),
            (LengthField::Extended16, [a, b]) => Ok(u64::from(u16::from_be_bytes([*a, *b]))),
            (LengthField::Extended64, bytes) if bytes.len() == 8 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(bytes);
                let len = u64::from_be_bytes(raw);
                if len >> 63 != 0 {
                    return Err(Error::ProtocolViolation(
                        "most significant bit of 64-bit payload length is set".into(),
                    ));
                }
                Ok(len)
            }
            _ => Err(Error::ProtocolViolation(format!(
                "expected {} extended length bytes, got {}",
                self.extra_bytes(),
                extended.len()
            ))),
        }
    }
}

/// Split the first header byte into FIN and opcode.
///
/// # Errors
///
/// Fails on RSV bits (no extensions are negotiated), reserved opcodes, and
/// control frames with FIN cleared.
pub fn decode_first_byte(byte: u8) -> Result<(bool, OpCode)> {
    if byte & RSV_BITS != 0 {
        return Err(Error::ReservedBitsSet);
    }
    let fin = byte & FIN_BIT != 0;
    let opcode = OpCode::try_from(byte & OPCODE_BITS)?;
    if opcode.is_control() && !fin {
        return Err(Error::FragmentedControlFrame);
    }
    Ok((fin, opcode))
}

/// Split the second header byte into the MASK bit and length indicator.
#[must_use]
pub const fn decode_second_byte(byte: u8) -> (bool, LengthField) {
    let masked = byte & MASK_BIT != 0;
    let field = match byte & LEN_BITS {
        126 => LengthField::Extended16,
        127 => LengthField::Extended64,
        len => LengthField::Inline(len),
    };
    (masked, field)
}

/// Parse a complete header from the start of `buf`.
///
/// Returns `Ok(None)` when `buf` does not yet hold the whole header,
/// otherwise the header and the number of bytes it occupied.
///
/// # Errors
///
/// Same as the individual decode steps.
pub fn parse_header(buf: &[u8]) -> Result<Option<(FrameHeader, usize)>> {
    let [byte0, byte1, rest @ ..] = buf else {
        return Ok(None);
    };
    let (fin, opcode) = decode_first_byte(*byte0)?;
    let (masked, field) = decode_second_byte(*byte1);

    let extra = field.extra_bytes();
    let mask_len = if masked { 4 } else { 0 };
    if rest.len() < extra + mask_len {
        return Ok(None);
    }

    let payload_len = field.decode(&rest[..extra])?;
    let mask = if masked {
        let mut key = [0u8; 4];
        key.copy_from_slice(&rest[extra..extra + 4]);
        Some(key)
    } else {
        None
    };

    Ok(Some((
        FrameHeader::new(fin, opcode, payload_len, mask),
        2 + extra + mask_len,
    )))
}
