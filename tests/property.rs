//! Property-based tests for framing, masking and the handshake.
//!
//! These tests use proptest to fuzz the codec and find edge cases.

use std::io::Cursor;

use bytes::BytesMut;
use proptest::prelude::*;
use rsws_client::codec::FrameReader;
use rsws_client::protocol::frame::FrameHeader;
use rsws_client::protocol::{
    OpCode, apply_mask, apply_mask_fast, encode_frame, parse_header, parse_response,
};
use rsws_client::{Limits, Role, compute_accept_key};

fn data_opcode_strategy() -> impl Strategy<Value = OpCode> {
    prop_oneof![
        Just(OpCode::Text),
        Just(OpCode::Binary),
        Just(OpCode::Continuation),
    ]
}

fn control_opcode_strategy() -> impl Strategy<Value = OpCode> {
    prop_oneof![Just(OpCode::Close), Just(OpCode::Ping), Just(OpCode::Pong)]
}

fn encode(fin: bool, opcode: OpCode, payload: &[u8], mask: Option<[u8; 4]>) -> Vec<u8> {
    let mut buf = BytesMut::new();
    encode_frame(&mut buf, fin, opcode, payload, mask);
    buf.to_vec()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

/// Decode `wire` the way a peer in `role` would.
fn decode(wire: Vec<u8>, role: Role) -> Option<rsws_client::protocol::Frame> {
    runtime().block_on(async {
        let mut reader = FrameReader::new(Cursor::new(wire), role, Limits::default());
        reader.read_frame().await.unwrap()
    })
}

proptest! {
    // =========================================================================
    // Property 1: Server frames decode to what was encoded
    // =========================================================================
    #[test]
    fn test_roundtrip_unmasked(
        fin in any::<bool>(),
        opcode in data_opcode_strategy(),
        payload in prop::collection::vec(any::<u8>(), 0..1000)
    ) {
        let wire = encode(fin, opcode, &payload, None);
        let frame = decode(wire, Role::Client).unwrap();
        prop_assert_eq!(frame.fin, fin);
        prop_assert_eq!(frame.opcode, opcode);
        prop_assert_eq!(frame.payload, payload);
    }

    // =========================================================================
    // Property 2: Client frames unmask to what was encoded
    // =========================================================================
    #[test]
    fn test_roundtrip_masked(
        opcode in data_opcode_strategy(),
        payload in prop::collection::vec(any::<u8>(), 0..500),
        mask in any::<[u8; 4]>()
    ) {
        let wire = encode(true, opcode, &payload, Some(mask));
        let frame = decode(wire, Role::Server).unwrap();
        prop_assert_eq!(frame.opcode, opcode);
        prop_assert_eq!(frame.payload, payload);
    }

    // =========================================================================
    // Property 3: Masking is involutive, and both kernels agree
    // =========================================================================
    #[test]
    fn test_mask_involution(
        data in prop::collection::vec(any::<u8>(), 0..2000),
        mask in any::<[u8; 4]>()
    ) {
        let mut masked = data.clone();
        apply_mask(&mut masked, mask);

        let mut fast = data.clone();
        apply_mask_fast(&mut fast, mask);
        prop_assert_eq!(&masked, &fast);

        apply_mask(&mut masked, mask);
        prop_assert_eq!(data, masked);
    }

    // =========================================================================
    // Property 4: Header length matches what parse_header consumes
    // =========================================================================
    #[test]
    fn test_header_length_accuracy(
        len in prop_oneof![0u64..=125, 126u64..=65535, 65536u64..=u32::MAX as u64],
        masked in any::<bool>()
    ) {
        let mask = masked.then_some([1, 2, 3, 4]);
        let header = FrameHeader::new(true, OpCode::Binary, len, mask);
        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        prop_assert_eq!(buf.len(), header.encoded_len());

        let (parsed, consumed) = parse_header(&buf).unwrap().unwrap();
        prop_assert_eq!(consumed, buf.len());
        prop_assert_eq!(parsed, header);
    }

    // =========================================================================
    // Property 5: A truncated header is incomplete, never an error
    // =========================================================================
    #[test]
    fn test_truncated_header(
        len in 0u64..=100_000,
        cut in 0usize..14
    ) {
        let header = FrameHeader::new(true, OpCode::Text, len, Some([9, 9, 9, 9]));
        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        let cut = cut.min(buf.len() - 1);
        prop_assert_eq!(parse_header(&buf[..cut]).unwrap(), None);
    }

    // =========================================================================
    // Property 6: Control frames are limited to 125 bytes
    // =========================================================================
    #[test]
    fn test_control_frame_size_limit(
        opcode in control_opcode_strategy(),
        len in 0usize..300
    ) {
        let payload = vec![0u8; len];
        let wire = encode(true, opcode, &payload, None);
        let result = runtime().block_on(async {
            let mut reader = FrameReader::new(Cursor::new(wire), Role::Client, Limits::default());
            reader.read_frame().await
        });
        if len <= 125 {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(result.is_err());
        }
    }

    // =========================================================================
    // Property 7: Arbitrary handshake responses never panic
    // =========================================================================
    #[test]
    fn test_handshake_parse_no_panic(
        lines in prop::collection::vec("[ -~]{0,60}", 0..8)
    ) {
        let _ = parse_response(&lines, "expected", &[]);
    }

    // =========================================================================
    // Property 8: Any key is accepted only with its own accept value
    // =========================================================================
    #[test]
    fn test_accept_value_matches_key(key in "[A-Za-z0-9+/]{22}==") {
        let accept = compute_accept_key(&key);
        let lines = vec![
            "HTTP/1.1 101 Switching Protocols".to_string(),
            "Upgrade: websocket".to_string(),
            "Connection: Upgrade".to_string(),
            format!("Sec-WebSocket-Accept: {accept}"),
        ];
        prop_assert!(parse_response(&lines, &accept, &[]).is_ok());
        prop_assert!(parse_response(&lines, &compute_accept_key("other"), &[]).is_err());
    }
}

// =============================================================================
// Length-field boundaries
// =============================================================================

#[test]
fn test_length_boundaries_roundtrip() {
    for len in [0usize, 1, 125, 126, 65535, 65536] {
        let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let wire = encode(true, OpCode::Binary, &payload, Some([0x37, 0xfa, 0x21, 0x3d]));

        let expected_header = match len {
            0..=125 => 2,
            126..=65535 => 4,
            _ => 10,
        } + 4;
        assert_eq!(wire.len(), expected_header + len, "length {len}");

        let frame = decode(wire, Role::Server).unwrap();
        assert_eq!(frame.payload, payload, "length {len}");
    }
}

#[test]
fn test_rfc_accept_vector() {
    assert_eq!(
        compute_accept_key("dGhlIHNhbXBsZSBub25jZQ=="),
        "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
    );
}

#[test]
fn test_zero_mask_is_identity() {
    let data = b"unchanged".to_vec();
    let mut masked = data.clone();
    apply_mask(&mut masked, [0, 0, 0, 0]);
    assert_eq!(masked, data);
}
