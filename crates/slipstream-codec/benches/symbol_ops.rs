use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use slipstream_codec::codec::{RlcEncoder, SwEncoder};
use slipstream_codec::coeff::FULL_DENSITY;
use slipstream_codec::gf256;

/// Benchmark the symbol-level GF(256) fused multiply-add hot path.
fn bench_symbol_add_scaled(c: &mut Criterion) {
    let src = vec![0xA5u8; 1200];
    let mut dst = vec![0x5Au8; 1200];

    let mut group = c.benchmark_group("gf256");
    group.throughput(Throughput::Bytes(1200));

    group.bench_function("symbol_add_scaled_1200B", |b| {
        b.iter(|| {
            gf256::symbol_add_scaled(black_box(&mut dst), black_box(0x53), black_box(&src));
        });
    });

    // coef == 1 takes the plain XOR fast path.
    group.bench_function("symbol_xor_1200B", |b| {
        b.iter(|| {
            gf256::symbol_add_scaled(black_box(&mut dst), black_box(1), black_box(&src));
        });
    });

    group.finish();
}

/// Benchmark repair synthesis over a full coding window.
fn bench_build_repair(c: &mut Criterion) {
    let symbol = Bytes::from(vec![0xABu8; 1200]);

    let mut group = c.benchmark_group("encoder");
    group.throughput(Throughput::Bytes(1200 * 32));

    group.bench_function("build_repair_window_32", |b| {
        let mut enc = RlcEncoder::new(1200, 32).unwrap();
        for esi in 0..32u32 {
            enc.add_source_symbol_to_coding_window(symbol.clone(), esi)
                .unwrap();
        }
        enc.generate_coding_coefs(7, FULL_DENSITY).unwrap();
        let mut out = vec![0u8; 1200];
        b.iter(|| {
            enc.build_repair_symbol_into(black_box(&mut out)).unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_symbol_add_scaled, bench_build_repair);
criterion_main!(benches);
