//! Payload masking (RFC 6455 Section 5.3).
//!
//! Every client frame carries a fresh 4-byte key and its payload is XORed
//! with `key[i % 4]`. The keys only need to be unpredictable to
//! intermediaries, so a seeded mixing counter is used instead of a
//! cryptographic generator per frame.

use std::time::{SystemTime, UNIX_EPOCH};

/// XOR `data` in place with the repeating 4-byte `key`.
///
/// Applying the same key twice restores the original bytes.
#[inline]
pub fn apply_mask(data: &mut [u8], key: [u8; 4]) {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= key[i % 4];
    }
}

/// Same result as [`apply_mask`], processed a word at a time.
#[inline]
pub fn apply_mask_fast(data: &mut [u8], key: [u8; 4]) {
    let key_word = u32::from_ne_bytes(key);
    let mut chunks = data.chunks_exact_mut(4);
    for chunk in &mut chunks {
        let word = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) ^ key_word;
        chunk.copy_from_slice(&word.to_ne_bytes());
    }
    // Tail starts at a multiple of four, so the key index restarts at zero.
    apply_mask(chunks.into_remainder(), key);
}

/// Produces masking keys, one per outgoing frame.
#[derive(Debug, Clone)]
pub struct MaskGenerator {
    state: u32,
}

impl MaskGenerator {
    /// Seed from the OS random source, or from the clock if that fails.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: random_seed(),
        }
    }

    /// Deterministic generator, for tests and benchmarks.
    #[must_use]
    pub const fn with_seed(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Next masking key.
    pub fn next_key(&mut self) -> [u8; 4] {
        self.state = self.state.wrapping_add(0x9E37_79B9);
        let mut x = self.state;
        x = (x ^ (x >> 16)).wrapping_mul(0x85EB_CA6B);
        x = (x ^ (x >> 13)).wrapping_mul(0xC2B2_AE35);
        (x ^ (x >> 16)).to_le_bytes()
    }
}

impl Default for MaskGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn random_seed() -> u32 {
    let mut buf = [0u8; 4];
    if getrandom::getrandom(&mut buf).is_ok() {
        return u32::from_le_bytes(buf);
    }
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ (d.as_secs() as u32))
        .unwrap_or(0x5EED_1234)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_rfc_example() {
        // RFC 6455 Section 5.7, masked "Hello".
        let key = [0x37, 0xfa, 0x21, 0x3d];
        let mut data = b"Hello".to_vec();
        apply_mask(&mut data, key);
        assert_eq!(data, vec![0x7f, 0x9f, 0x4d, 0x51, 0x58]);
    }

    #[test]
    fn test_mask_twice_restores() {
        let key = [0x12, 0x34, 0x56, 0x78];
        let original = b"Hello, WebSocket!".to_vec();
        let mut data = original.clone();

        apply_mask(&mut data, key);
        assert_ne!(data, original);
        apply_mask(&mut data, key);
        assert_eq!(data, original);
    }

    #[test]
    fn test_mask_empty() {
        let mut data: Vec<u8> = vec![];
        apply_mask_fast(&mut data, [1, 2, 3, 4]);
        assert!(data.is_empty());
    }

    #[test]
    fn test_mask_fast_matches_scalar() {
        let key = [0xab, 0xcd, 0xef, 0x12];
        for size in [0, 1, 2, 3, 4, 5, 7, 8, 9, 15, 16, 17, 125, 126, 1000] {
            let original: Vec<u8> = (0..size).map(|i| (i & 0xff) as u8).collect();
            let mut scalar = original.clone();
            let mut fast = original.clone();

            apply_mask(&mut scalar, key);
            apply_mask_fast(&mut fast, key);

            assert_eq!(scalar, fast, "mismatch at size {size}");
        }
    }

    #[test]
    fn test_generator_keys_vary() {
        let mut generator = MaskGenerator::with_seed(0);
        let a = generator.next_key();
        let b = generator.next_key();
        let c = generator.next_key();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, [0, 0, 0, 0]);
    }

    #[test]
    fn test_generator_deterministic_with_seed() {
        let mut g1 = MaskGenerator::with_seed(42);
        let mut g2 = MaskGenerator::with_seed(42);
        for _ in 0..8 {
            assert_eq!(g1.next_key(), g2.next_key());
        }
    }

    #[test]
    fn test_generators_seeded_independently() {
        let mut g1 = MaskGenerator::new();
        let mut g2 = MaskGenerator::new();
        let keys1: Vec<_> = (0..4).map(|_| g1.next_key()).collect();
        let keys2: Vec<_> = (0..4).map(|_| g2.next_key()).collect();
        assert_ne!(keys1, keys2);
    }
}
