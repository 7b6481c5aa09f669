//! Checks applied to every incoming frame header before its payload is read.
//!
//! - Masking rules per RFC 6455 Section 5.1
//! - Control frame payload bound (Section 5.5)
//! - Configured frame size limit

use crate::config::Limits;
use crate::connection::Role;
use crate::error::{Error, Result};
use crate::protocol::frame::{FrameHeader, MAX_CONTROL_FRAME_PAYLOAD};

/// Validator for incoming frame headers, bound to the local role.
#[derive(Debug, Clone)]
pub struct FrameValidator {
    role: Role,
    limits: Limits,
}

impl FrameValidator {
    /// Create a validator for frames received by `role`.
    #[must_use]
    pub const fn new(role: Role, limits: Limits) -> Self {
        Self { role, limits }
    }

    /// Validate a decoded header.
    ///
    /// # Errors
    ///
    /// - `Error::MaskedServerFrame` - client received a masked frame
    /// - `Error::UnmaskedClientFrame` - server received an unmasked frame
    /// - `Error::ControlFrameTooLarge` - control payload over 125 bytes
    /// - `Error::FrameTooLarge` - payload over the configured limit
    pub fn validate(&self, header: &FrameHeader) -> Result<()> {
        self.validate_masking(header.is_masked())?;

        if header.opcode.is_control() && header.payload_len > MAX_CONTROL_FRAME_PAYLOAD as u64 {
            return Err(Error::ControlFrameTooLarge(
                usize::try_from(header.payload_len).unwrap_or(usize::MAX),
            ));
        }

        self.limits.check_frame_size(header.payload_len)
    }

    fn validate_masking(&self, masked: bool) -> Result<()> {
        match (self.role.expects_masked(), masked) {
            (false, true) => Err(Error::MaskedServerFrame),
            (true, false) => Err(Error::UnmaskedClientFrame),
            _ => Ok(()),
        }
    }
}
