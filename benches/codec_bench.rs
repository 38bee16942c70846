//! Performance benchmarks for the datagram codec.
//!
//! The dispatcher decodes every datagram the gateway buffers, so decode and
//! compose sit on the monitor hot path.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench codec_bench
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use scsgate_protocol::{Message, checksum, compose};
use std::hint::black_box;

/// Benchmark decoding one datagram of each known shape.
fn bench_decode_shapes(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_shapes");
    group.throughput(Throughput::Elements(1));

    let shapes: [(&str, &[u8]); 5] = [
        ("ack", b"A5"),
        ("state", b"A8B833120098A3"),
        ("command", b"A83300120021A3"),
        ("request_status", b"A83300150026A3"),
        ("unknown", b"A8330015000026A3"),
    ];

    for (name, raw) in shapes {
        group.bench_function(name, |b| {
            b.iter(|| black_box(Message::decode(black_box(raw))));
        });
    }

    group.finish();
}

/// Benchmark composing a four-group telegram.
fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");
    group.throughput(Throughput::Elements(1));

    let body = [0x12u8, 0x00, 0x15, 0x00];

    group.bench_function("status_request_body", |b| {
        b.iter(|| black_box(compose(black_box(&body))));
    });

    group.finish();
}

/// Benchmark the checksum fold alone.
fn bench_checksum(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum");
    group.throughput(Throughput::Elements(1));

    let body = [0x96u8, 0xBE, 0x31, 0x00];

    group.bench_function("four_groups", |b| {
        b.iter(|| black_box(checksum(black_box(&body))));
    });

    group.finish();
}

/// Benchmark decoding batches, the shape of a busy monitor loop.
fn bench_decode_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_batch");

    for batch_size in [100, 1000] {
        group.throughput(Throughput::Elements(batch_size as u64));

        let datagrams: Vec<Vec<u8>> = (0..batch_size)
            .map(|i| compose(&[0xB8, (i % 256) as u8, 0x12, 0x00]).to_vec())
            .collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            &datagrams,
            |b, datagrams| {
                b.iter(|| {
                    let mut count = 0;
                    for raw in datagrams {
                        if !matches!(Message::decode(raw), Message::Unknown { .. }) {
                            count += 1;
                        }
                    }
                    black_box(count);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark a compose/decode roundtrip.
fn bench_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("roundtrip");
    group.throughput(Throughput::Elements(1));

    let body = [0x33u8, 0x00, 0x12, 0x00];

    group.bench_function("compose_then_decode", |b| {
        b.iter(|| {
            let encoded = compose(black_box(&body));
            black_box(Message::decode(&encoded));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_decode_shapes,
    bench_compose,
    bench_checksum,
    bench_decode_batch,
    bench_roundtrip,
);

criterion_main!(benches);
