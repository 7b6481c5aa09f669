//! Incremental UTF-8 decoding of text payloads.
//!
//! A streamed text message can split a multi-byte character across two
//! frames. [`TextDecoder`] holds back the incomplete tail of a non-final
//! chunk and prepends it to the next one, so every decoded chunk consists of
//! whole characters.

use crate::error::{Error, Result};

/// Decoder for the chunks of one text message.
#[derive(Debug, Clone, Default)]
pub struct TextDecoder {
    /// Incomplete trailing sequence of the previous chunk (at most 3 bytes).
    carry: Vec<u8>,
}

impl TextDecoder {
    /// Create a decoder with nothing carried over.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk.
    ///
    /// For a non-final chunk an incomplete sequence at the end is kept for
    /// the next call. A final chunk must end on a character boundary; the
    /// decoder is empty again afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUtf8`] on malformed input, or on a final
    /// chunk that ends mid-character.
    pub fn decode(&mut self, chunk: Vec<u8>, is_final: bool) -> Result<String> {
        let mut bytes = if self.carry.is_empty() {
            chunk
        } else {
            let mut joined = std::mem::take(&mut self.carry);
            joined.extend_from_slice(&chunk);
            joined
        };

        if let Err(e) = std::str::from_utf8(&bytes) {
            let truncated = e.error_len().is_none();
            if is_final || !truncated {
                self.carry.clear();
                return Err(Error::InvalidUtf8);
            }
            self.carry = bytes.split_off(e.valid_up_to());
        }

        String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
    }

    /// Whether bytes are being held back for the next chunk.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.carry.is_empty()
    }

    /// Drop any carried bytes.
    pub fn reset(&mut self) {
        self.carry.clear();
    }
}

/// Decode a complete, unfragmented text payload.
///
/// # Errors
///
/// Returns [`Error::InvalidUtf8`] if the payload is not valid UTF-8.
pub fn decode_text(payload: Vec<u8>) -> Result<String> {
    String::from_utf8(payload).map_err(|_| Error::InvalidUtf8)
}
