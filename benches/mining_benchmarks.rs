//! Benchmarks for the ziftr digest pipeline and nonce search

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tokio_util::sync::CancellationToken;
use ziftr_mining_client::crypto::pow_hash;
use ziftr_mining_client::types::{Header, Nonce, Target};
use ziftr_mining_client::worker::scan_range;

fn bench_pow_hash(c: &mut Criterion) {
    let header = Header::from_bytes(&[0x5au8; Header::SIZE]).unwrap();

    c.bench_function("pow_hash", |b| b.iter(|| pow_hash(black_box(&header))));
}

fn bench_scan_range(c: &mut Criterion) {
    let template = Header::from_bytes(&[0x5au8; Header::SIZE]).unwrap();
    let target = Target::min();
    let cancel = CancellationToken::new();

    c.bench_function("scan_range_64", |b| {
        b.iter(|| {
            scan_range(
                black_box(&template),
                &target,
                Nonce::new(0),
                Nonce::new(64),
                &cancel,
            )
        })
    });
}

criterion_group!(benches, bench_pow_hash, bench_scan_range);
criterion_main!(benches);
