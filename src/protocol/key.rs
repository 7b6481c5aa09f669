//! `Sec-WebSocket-Key` generation and `Sec-WebSocket-Accept` computation.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use sha1::{Digest, Sha1};

/// Magic string appended to the client key before hashing (RFC 6455 Section 1.3).
pub const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Client key and the accept value a compliant server must answer with.
///
/// One pair is made per connection attempt and consumed by response
/// validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// Value sent in `Sec-WebSocket-Key`.
    pub client_key: String,
    /// Value expected in `Sec-WebSocket-Accept`.
    pub expected_accept: String,
}

/// Generate a fresh key pair from the high-resolution clock.
///
/// The nonce is the 16-byte big-endian nanosecond timestamp, which base64
/// encodes to the 24-character key RFC 6455 expects.
#[must_use]
pub fn generate() -> KeyPair {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    from_nonce(&nanos.to_be_bytes())
}

/// Build the key pair for an explicit nonce.
#[must_use]
pub fn from_nonce(nonce: &[u8]) -> KeyPair {
    let client_key = BASE64.encode(nonce);
    let expected_accept = compute_accept_key(&client_key);
    KeyPair {
        client_key,
        expected_accept,
    }
}

/// `base64(SHA-1(key + GUID))`.
#[must_use]
pub fn compute_accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WS_GUID.as_bytes());
    BASE64.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_key_rfc_vector() {
        assert_eq!(
            compute_accept_key("dGhlIHNhbXBsZSBub25jZQ=="),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }

    #[test]
    fn test_from_nonce_rfc_vector() {
        let pair = from_nonce(b"the sample nonce");
        assert_eq!(pair.client_key, "dGhlIHNhbXBsZSBub25jZQ==");
        assert_eq!(pair.expected_accept, "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
    }

    #[test]
    fn test_generate_shape() {
        let pair = generate();
        assert_eq!(pair.client_key.len(), 24);
        assert_eq!(BASE64.decode(&pair.client_key).unwrap().len(), 16);
        assert_eq!(pair.expected_accept, compute_accept_key(&pair.client_key));
    }

    #[test]
    fn test_accept_key_depends_on_guid() {
        let key = "dGhlIHNhbXBsZSBub25jZQ==";
        let mut hasher = Sha1::new();
        hasher.update(key.as_bytes());
        let without_guid = BASE64.encode(hasher.finalize());
        assert_ne!(compute_accept_key(key), without_guid);
    }
}
