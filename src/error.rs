//! Error types for the WebSocket client.
//!
//! Every failure belongs to one of four kinds (see [`ErrorKind`]): usage
//! mistakes made by the caller, opening-handshake failures, transport
//! failures, and protocol violations committed by the peer.

use thiserror::Error;

use crate::message::CloseCode;

/// Result type alias for WebSocket operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during WebSocket operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Invalid argument or invalid state for the requested operation.
    #[error("Usage error: {0}")]
    Usage(String),

    /// The opening handshake failed.
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// Connecting, reading or writing the underlying transport failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Protocol violation detected.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Invalid UTF-8 in text frame.
    #[error("Invalid UTF-8 in text frame")]
    InvalidUtf8,

    /// Frame size exceeds configured maximum.
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge {
        /// Announced frame size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// Server opening handshake exceeds configured maximum.
    #[error("Handshake too large: {size} bytes (max: {max})")]
    HandshakeTooLarge {
        /// Bytes received so far.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Header value cannot be placed in the opening handshake.
    #[error("Invalid value for header {header}: {reason}")]
    InvalidHeaderValue {
        /// Header name.
        header: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Reserved opcode used.
    #[error("Reserved opcode: {0:#x}")]
    ReservedOpcode(u8),

    /// Invalid opcode value.
    #[error("Invalid opcode: {0:#x}")]
    InvalidOpcode(u8),

    /// Control frame fragmented (RFC violation).
    #[error("Control frames cannot be fragmented")]
    FragmentedControlFrame,

    /// Control frame payload too large (>125 bytes).
    #[error("Control frame payload too large: {0} bytes (max: 125)")]
    ControlFrameTooLarge(usize),

    /// Unmasked client frame (security violation).
    #[error("Client frame must be masked")]
    UnmaskedClientFrame,

    /// Masked server frame (security violation).
    #[error("Server frame must not be masked")]
    MaskedServerFrame,

    /// Reserved bits set without extension.
    #[error("Reserved bits set without negotiated extension")]
    ReservedBitsSet,
}

/// The four error categories a caller has to tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Programmer mistake: fix the call.
    Usage,
    /// The server refused or botched the opening handshake.
    Handshake,
    /// The environment failed (timeout, unknown host, broken pipe).
    Transport,
    /// The peer broke RFC 6455.
    Protocol,
}

impl Error {
    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::Usage(_) | Error::InvalidHeaderValue { .. } => ErrorKind::Usage,
            Error::Handshake(_) | Error::HandshakeTooLarge { .. } => ErrorKind::Handshake,
            Error::Transport(_) => ErrorKind::Transport,
            Error::ProtocolViolation(_)
            | Error::InvalidUtf8
            | Error::FrameTooLarge { .. }
            | Error::ReservedOpcode(_)
            | Error::InvalidOpcode(_)
            | Error::FragmentedControlFrame
            | Error::ControlFrameTooLarge(_)
            | Error::UnmaskedClientFrame
            | Error::MaskedServerFrame
            | Error::ReservedBitsSet => ErrorKind::Protocol,
        }
    }

    /// Returns `true` for caller mistakes.
    #[must_use]
    pub const fn is_usage(&self) -> bool {
        matches!(self.kind(), ErrorKind::Usage)
    }

    /// Status code to put in the close frame sent after this error ended a connection.
    #[must_use]
    pub const fn close_code(&self) -> CloseCode {
        match self {
            Error::InvalidUtf8 => CloseCode::InvalidPayload,
            Error::FrameTooLarge { .. } => CloseCode::MessageTooBig,
            _ => match self.kind() {
                ErrorKind::Protocol => CloseCode::ProtocolError,
                _ => CloseCode::Normal,
            },
        }
    }

    pub(crate) fn usage(msg: impl Into<String>) -> Self {
        Error::Usage(msg.into())
    }

    pub(crate) fn not_connected() -> Self {
        Error::Usage("not connected to a websocket server".into())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(_: std::str::Utf8Error) -> Self {
        Error::InvalidUtf8
    }
}
