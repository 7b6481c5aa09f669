use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use crate::connection::Role;
use crate::error::Result;
use crate::protocol::OpCode;
use crate::protocol::frame::encode_frame;
use crate::protocol::mask::MaskGenerator;

/// Buffered frame writer for one stream.
///
/// Every write is flushed before it returns, so a completed call means the
/// bytes were handed to the transport.
pub struct FrameWriter<W> {
    io: BufWriter<W>,
    role: Role,
    masks: MaskGenerator,
    scratch: BytesMut,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Wrap `io` behind a buffer of `capacity` bytes.
    #[must_use]
    pub fn new(io: W, role: Role, capacity: usize) -> Self {
        Self {
            io: BufWriter::with_capacity(capacity.max(1), io),
            role,
            masks: MaskGenerator::new(),
            scratch: BytesMut::with_capacity(capacity.max(16)),
        }
    }

    /// Replace the mask generator, for deterministic output in tests.
    #[must_use]
    pub fn with_masks(mut self, masks: MaskGenerator) -> Self {
        self.masks = masks;
        self
    }

    /// Write pre-encoded bytes, such as the opening handshake request.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` on I/O failure.
    pub async fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.io.write_all(bytes).await?;
        self.io.flush().await?;
        Ok(())
    }

    /// Encode and write one frame; masked with a fresh key for the client role.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` on I/O failure.
    pub async fn write_frame(&mut self, fin: bool, opcode: OpCode, payload: &[u8]) -> Result<()> {
        let mask = self.role.must_mask().then(|| self.masks.next_key());

        self.scratch.clear();
        encode_frame(&mut self.scratch, fin, opcode, payload, mask);
        self.io.write_all(&self.scratch).await?;
        self.io.flush().await?;
        Ok(())
    }

    /// Flush and shut down the write half.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if the stream is already broken.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.io.shutdown().await?;
        Ok(())
    }
}
