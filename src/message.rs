//! Application messages and close status codes.

use crate::error::{Error, Result};

/// Status code carried in a close frame (RFC 6455 Section 7.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum CloseCode {
    /// 1000: the purpose of the connection has been fulfilled.
    #[default]
    Normal,
    /// 1001: the endpoint is going away.
    GoingAway,
    /// 1002: protocol error.
    ProtocolError,
    /// 1003: received a data type the endpoint cannot accept.
    UnsupportedData,
    /// 1007: message data inconsistent with its type (e.g. non-UTF-8 text).
    InvalidPayload,
    /// 1008: message violates the endpoint's policy.
    PolicyViolation,
    /// 1009: message too big to process.
    MessageTooBig,
    /// 1010: the server did not negotiate a required extension.
    MandatoryExtension,
    /// Any other code.
    Other(u16),
}

impl CloseCode {
    /// Map a wire value to a `CloseCode`.
    #[must_use]
    pub const fn from_u16(code: u16) -> Self {
        match code {
            1000 => CloseCode::Normal,
            1001 => CloseCode::GoingAway,
            1002 => CloseCode::ProtocolError,
            1003 => CloseCode::UnsupportedData,
            1007 => CloseCode::InvalidPayload,
            1008 => CloseCode::PolicyViolation,
            1009 => CloseCode::MessageTooBig,
            1010 => CloseCode::MandatoryExtension,
            other => CloseCode::Other(other),
        }
    }

    /// Wire value of this code.
    #[must_use]
    pub const fn as_u16(&self) -> u16 {
        match self {
            CloseCode::Normal => 1000,
            CloseCode::GoingAway => 1001,
            CloseCode::ProtocolError => 1002,
            CloseCode::UnsupportedData => 1003,
            CloseCode::InvalidPayload => 1007,
            CloseCode::PolicyViolation => 1008,
            CloseCode::MessageTooBig => 1009,
            CloseCode::MandatoryExtension => 1010,
            CloseCode::Other(code) => *code,
        }
    }

    /// Codes an endpoint must never put on the wire (1004-1006, 1015).
    #[must_use]
    pub const fn is_reserved(&self) -> bool {
        matches!(self.as_u16(), 1004..=1006 | 1015)
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// Decoded payload of a close frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseFrame {
    /// The close status code.
    pub code: CloseCode,
    /// Human-readable reason (UTF-8, at most 123 bytes).
    pub reason: String,
}

impl CloseFrame {
    /// Longest reason that still fits in a control frame.
    pub const MAX_REASON_LEN: usize = 123;

    /// Create a new close frame with the given code and reason.
    #[must_use]
    pub fn new(code: CloseCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// Encode as a close payload: big-endian code followed by the reason bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Usage`] if the reason does not fit in a control frame
    /// or the code is reserved.
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        if self.reason.len() > Self::MAX_REASON_LEN {
            return Err(Error::usage(format!(
                "close reason is {} bytes, at most {} allowed",
                self.reason.len(),
                Self::MAX_REASON_LEN
            )));
        }
        if self.code.is_reserved() {
            return Err(Error::usage(format!(
                "close code {} must not be sent",
                self.code
            )));
        }
        let mut payload = Vec::with_capacity(2 + self.reason.len());
        payload.extend_from_slice(&self.code.as_u16().to_be_bytes());
        payload.extend_from_slice(self.reason.as_bytes());
        Ok(payload)
    }

    /// Parse a received close payload.
    ///
    /// An empty payload carries no status and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// A one-byte payload is a protocol violation; a reason that is not
    /// UTF-8 is [`Error::InvalidUtf8`].
    pub fn from_payload(payload: &[u8]) -> Result<Option<Self>> {
        match payload {
            [] => Ok(None),
            [_] => Err(Error::ProtocolViolation(
                "close frame payload of one byte".into(),
            )),
            [hi, lo, reason @ ..] => {
                let code = CloseCode::from_u16(u16::from_be_bytes([*hi, *lo]));
                let reason = std::str::from_utf8(reason)?;
                Ok(Some(Self::new(code, reason)))
            }
        }
    }
}

/// A complete message or one chunk of a streamed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// UTF-8 text.
    Text(String),
    /// Arbitrary bytes.
    Binary(Vec<u8>),
}

impl Message {
    /// Create a text message.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Message::Text(s.into())
    }

    /// Create a binary message.
    #[must_use]
    pub fn binary(data: impl Into<Vec<u8>>) -> Self {
        Message::Binary(data.into())
    }

    /// Returns `true` if this is a text message.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Message::Text(_))
    }

    /// Returns `true` if this is a binary message.
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self, Message::Binary(_))
    }

    /// Borrow the text content, if this is a text message.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Message::Text(s) => Some(s),
            Message::Binary(_) => None,
        }
    }

    /// Borrow the binary content, if this is a binary message.
    #[must_use]
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Message::Binary(data) => Some(data),
            Message::Text(_) => None,
        }
    }

    /// Payload bytes as they go on the wire.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Message::Text(s) => s.as_bytes(),
            Message::Binary(data) => data,
        }
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns `true` if the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Message::Text(s)
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Message::Text(s.to_owned())
    }
}

impl From<Vec<u8>> for Message {
    fn from(data: Vec<u8>) -> Self {
        Message::Binary(data)
    }
}

impl From<&[u8]> for Message {
    fn from(data: &[u8]) -> Self {
        Message::Binary(data.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::text("hello"), Message::Text("hello".into()));
        assert_eq!(Message::binary([1, 2, 3]), Message::Binary(vec![1, 2, 3]));
        assert_eq!(Message::from("x"), Message::Text("x".into()));
        assert_eq!(Message::from(vec![7u8]), Message::Binary(vec![7]));
    }

    #[test]
    fn test_message_accessors() {
        let text = Message::text("héllo");
        assert!(text.is_text());
        assert_eq!(text.as_text(), Some("héllo"));
        assert_eq!(text.as_binary(), None);
        assert_eq!(text.len(), 6);

        let bin = Message::binary(Vec::new());
        assert!(bin.is_binary());
        assert!(bin.is_empty());
        assert_eq!(bin.as_bytes(), &[] as &[u8]);
    }

    #[test]
    fn test_close_code_mapping() {
        for code in [1000, 1001, 1002, 1003, 1007, 1008, 1009, 1010, 4000] {
            assert_eq!(CloseCode::from_u16(code).as_u16(), code);
        }
        assert_eq!(CloseCode::from_u16(1000), CloseCode::Normal);
        assert_eq!(CloseCode::from_u16(1011), CloseCode::Other(1011));
        assert_eq!(CloseCode::default(), CloseCode::Normal);
    }

    #[test]
    fn test_close_code_reserved() {
        assert!(CloseCode::Other(1005).is_reserved());
        assert!(CloseCode::Other(1015).is_reserved());
        assert!(!CloseCode::Normal.is_reserved());
        assert!(!CloseCode::Other(3000).is_reserved());
    }

    #[test]
    fn test_close_frame_payload() {
        let frame = CloseFrame::new(CloseCode::Normal, "bye");
        assert_eq!(frame.to_payload().unwrap(), vec![0x03, 0xE8, b'b', b'y', b'e']);

        let empty = CloseFrame::new(CloseCode::GoingAway, "");
        assert_eq!(empty.to_payload().unwrap(), vec![0x03, 0xE9]);
    }

    #[test]
    fn test_close_frame_reason_too_long() {
        let frame = CloseFrame::new(CloseCode::Normal, "x".repeat(124));
        assert!(matches!(frame.to_payload(), Err(Error::Usage(_))));

        let frame = CloseFrame::new(CloseCode::Normal, "x".repeat(123));
        assert_eq!(frame.to_payload().unwrap().len(), 125);
    }

    #[test]
    fn test_close_frame_reserved_code() {
        let frame = CloseFrame::new(CloseCode::Other(1006), "");
        assert!(matches!(frame.to_payload(), Err(Error::Usage(_))));
    }

    #[test]
    fn test_close_frame_parse() {
        assert_eq!(CloseFrame::from_payload(&[]).unwrap(), None);
        assert_eq!(
            CloseFrame::from_payload(&[0x03, 0xEA, b'o', b'k']).unwrap(),
            Some(CloseFrame::new(CloseCode::ProtocolError, "ok"))
        );
        assert!(matches!(
            CloseFrame::from_payload(&[0x03]),
            Err(Error::ProtocolViolation(_))
        ));
        assert_eq!(
            CloseFrame::from_payload(&[0x03, 0xE8, 0xFF]),
            Err(Error::InvalidUtf8)
        );
    }
}
