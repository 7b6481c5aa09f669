use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use crate::config::Limits;
use crate::connection::Role;
use crate::error::{Error, Result};
use crate::protocol::frame::{Frame, FrameHeader, decode_first_byte, decode_second_byte};
use crate::protocol::mask::apply_mask_fast;
use crate::protocol::validation::FrameValidator;

/// Largest buffer reserved up front for a payload; bigger payloads grow
/// as their bytes actually arrive.
const INITIAL_PAYLOAD_CAPACITY: usize = 64 * 1024;

/// Reads the server's opening handshake and then frames from one stream.
///
/// Reads never go further than the field being decoded. A stream that ends
/// anywhere inside a frame is reported as `Ok(None)`, the same as a stream
/// that ends between frames.
pub struct FrameReader<R> {
    io: BufReader<R>,
    validator: FrameValidator,
    limits: Limits,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Wrap `io`, validating incoming frames as seen by `role`.
    #[must_use]
    pub fn new(io: R, role: Role, limits: Limits) -> Self {
        Self {
            io: BufReader::new(io),
            validator: FrameValidator::new(role, limits.clone()),
            limits,
        }
    }

    /// Read header lines up to and excluding the blank line.
    ///
    /// Lines are decoded as ISO-8859-1 with the line terminator removed.
    ///
    /// # Errors
    ///
    /// - `Error::HandshakeTooLarge` if more than `max_handshake_size` bytes arrive first
    /// - `Error::Handshake` if the stream ends before the blank line
    /// - `Error::Transport` on I/O failure
    pub async fn read_handshake(&mut self) -> Result<Vec<String>> {
        let max = self.limits.max_handshake_size;
        let mut lines = Vec::new();
        let mut total = 0usize;
        let mut raw = Vec::with_capacity(128);

        loop {
            raw.clear();
            let budget = (max - total.min(max)) as u64 + 1;
            let n = (&mut self.io).take(budget).read_until(b'\n', &mut raw).await?;
            total += n;
            self.limits.check_handshake_size(total)?;

            if raw.last() != Some(&b'\n') {
                return Err(Error::Handshake(
                    "connection closed during the opening handshake".into(),
                ));
            }
            raw.pop();
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }
            if raw.is_empty() {
                return Ok(lines);
            }
            lines.push(raw.iter().map(|&b| char::from(b)).collect());
        }
    }

    /// Read the first header byte of the next frame, `None` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` on I/O failure.
    pub async fn read_first_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.io.read(&mut byte).await? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Read the rest of a frame whose first byte has already been consumed.
    ///
    /// # Errors
    ///
    /// Protocol errors from header decoding and validation, or
    /// `Error::Transport` on I/O failure.
    pub async fn read_frame_after(&mut self, first_byte: u8) -> Result<Option<Frame>> {
        let (fin, opcode) = decode_first_byte(first_byte)?;

        let Some(second) = self.read_exact_or_eof::<1>().await? else {
            return Ok(None);
        };
        let (masked, field) = decode_second_byte(second[0]);

        let payload_len = match field.extra_bytes() {
            0 => field.decode(&[])?,
            2 => match self.read_exact_or_eof::<2>().await? {
                Some(bytes) => field.decode(&bytes)?,
                None => return Ok(None),
            },
            _ => match self.read_exact_or_eof::<8>().await? {
                Some(bytes) => field.decode(&bytes)?,
                None => return Ok(None),
            },
        };

        let mask = if masked {
            match self.read_exact_or_eof::<4>().await? {
                Some(key) => Some(key),
                None => return Ok(None),
            }
        } else {
            None
        };

        let header = FrameHeader::new(fin, opcode, payload_len, mask);
        self.validator.validate(&header)?;

        let Some(mut payload) = self.read_payload(payload_len).await? else {
            return Ok(None);
        };
        if let Some(key) = mask {
            apply_mask_fast(&mut payload, key);
        }

        Ok(Some(Frame {
            fin,
            opcode,
            payload,
        }))
    }

    /// Read one whole frame, `None` at end of stream.
    ///
    /// # Errors
    ///
    /// Same as [`read_frame_after`](Self::read_frame_after).
    pub async fn read_frame(&mut self) -> Result<Option<Frame>> {
        match self.read_first_byte().await? {
            Some(byte) => self.read_frame_after(byte).await,
            None => Ok(None),
        }
    }

    async fn read_exact_or_eof<const N: usize>(&mut self) -> Result<Option<[u8; N]>> {
        let mut buf = [0u8; N];
        match self.io.read_exact(&mut buf).await {
            Ok(_) => Ok(Some(buf)),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_payload(&mut self, len: u64) -> Result<Option<Vec<u8>>> {
        let expected = usize::try_from(len).map_err(|_| Error::FrameTooLarge {
            size: len,
            max: usize::MAX as u64,
        })?;

        let mut payload = Vec::with_capacity(expected.min(INITIAL_PAYLOAD_CAPACITY));
        (&mut self.io).take(len).read_to_end(&mut payload).await?;
        if payload.len() < expected {
            return Ok(None);
        }
        Ok(Some(payload))
    }

    /// Consume the reader and return the wrapped stream.
    ///
    /// Bytes already buffered are lost.
    #[must_use]
    pub fn into_inner(self) -> R {
        self.io.into_inner()
    }
}
