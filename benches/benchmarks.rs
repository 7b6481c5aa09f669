//! Benchmarks for the client's hot paths.
//!
//! Run with: `cargo bench`

use bytes::BytesMut;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rsws_client::protocol::handshake::{build_request, parse_response};
use rsws_client::protocol::key;
use rsws_client::protocol::mask::{MaskGenerator, apply_mask, apply_mask_fast};
use rsws_client::protocol::{OpCode, encode_frame, parse_header};
use rsws_client::compute_accept_key;

const SIZES: [usize; 4] = [10, 1024, 65536, 1024 * 1024];

// =============================================================================
// Frame Encoding Benchmarks
// =============================================================================

fn bench_frame_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_encoding");

    for size in SIZES {
        let payload = vec![0xAB; size];
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("unmasked", size), &payload, |b, payload| {
            let mut buf = BytesMut::with_capacity(size + 14);
            b.iter(|| {
                buf.clear();
                encode_frame(&mut buf, true, OpCode::Binary, black_box(payload), None);
            })
        });

        group.bench_with_input(BenchmarkId::new("masked", size), &payload, |b, payload| {
            let mut buf = BytesMut::with_capacity(size + 14);
            let mut masks = MaskGenerator::with_seed(0x5EED);
            b.iter(|| {
                buf.clear();
                let mask = Some(masks.next_key());
                encode_frame(&mut buf, true, OpCode::Binary, black_box(payload), mask);
            })
        });
    }

    group.finish();
}

fn bench_header_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("header_parsing");

    for size in [10usize, 1024, 65536] {
        let mut wire = BytesMut::new();
        encode_frame(&mut wire, true, OpCode::Binary, &vec![0u8; size], None);
        group.bench_with_input(BenchmarkId::from_parameter(size), &wire, |b, wire| {
            b.iter(|| parse_header(black_box(wire)))
        });
    }

    group.finish();
}

// =============================================================================
// Masking Benchmarks
// =============================================================================

fn bench_masking(c: &mut Criterion) {
    let mut group = c.benchmark_group("masking");
    let mask = [0x37, 0xfa, 0x21, 0x3d];

    for size in SIZES {
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_function(BenchmarkId::new("apply_mask", size), |b| {
            let mut data = vec![0xAB; size];
            b.iter(|| apply_mask(black_box(&mut data), mask))
        });

        group.bench_function(BenchmarkId::new("apply_mask_fast", size), |b| {
            let mut data = vec![0xAB; size];
            b.iter(|| apply_mask_fast(black_box(&mut data), mask))
        });
    }

    group.finish();
}

// =============================================================================
// Handshake Benchmarks
// =============================================================================

fn bench_handshake(c: &mut Criterion) {
    let mut group = c.benchmark_group("handshake");

    let key = "dGhlIHNhbXBsZSBub25jZQ==";
    group.bench_function("compute_accept_key", |b| {
        b.iter(|| compute_accept_key(black_box(key)))
    });

    group.bench_function("generate_key_pair", |b| b.iter(key::generate));

    let protocols = vec!["chat".to_string(), "superchat".to_string()];
    group.bench_function("build_request", |b| {
        b.iter(|| {
            build_request(
                black_box("/chat?room=1"),
                black_box("example.com:8080"),
                key,
                &protocols,
            )
        })
    });

    let accept = compute_accept_key(key);
    let lines = vec![
        "HTTP/1.1 101 Switching Protocols".to_string(),
        "Upgrade: websocket".to_string(),
        "Connection: Upgrade".to_string(),
        format!("Sec-WebSocket-Accept: {accept}"),
        "Sec-WebSocket-Protocol: superchat".to_string(),
    ];
    group.bench_function("parse_response", |b| {
        b.iter(|| parse_response(black_box(&lines), &accept, &protocols))
    });

    group.finish();
}

// =============================================================================
// Criterion Setup
// =============================================================================

criterion_group!(
    benches,
    bench_frame_encoding,
    bench_header_parsing,
    bench_masking,
    bench_handshake
);

criterion_main!(benches);
