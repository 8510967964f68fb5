//! # CC-01 Difficulty Benchmarks
//!
//! Every variant over a full history window, plus the per-hash PoW check
//! that runs once per candidate block.

use cc_01_difficulty::{check_hash_meets_difficulty, history_len, next_difficulty};
use criterion::{black_box, BenchmarkId, Criterion};
use shared_types::keccak256;

fn history(len: usize) -> (Vec<u64>, Vec<u64>) {
    let timestamps = (0..len as u64).map(|i| 1_600_000_000 + i * 120 + i % 7).collect();
    let cumulative = (0..len as u64).map(|i| (i + 1) * 250_000 + i % 13).collect();
    (timestamps, cumulative)
}

pub fn bench_next_difficulty(c: &mut Criterion) {
    let mut group = c.benchmark_group("cc-01/next_difficulty");

    // One representative version per variant.
    for version in [1u8, 8, 11, 16] {
        let (timestamps, cumulative) = history(history_len(version));
        group.bench_with_input(BenchmarkId::from_parameter(version), &version, |b, &v| {
            b.iter(|| next_difficulty(black_box(&timestamps), black_box(&cumulative), v))
        });
    }
    group.finish();
}

pub fn bench_check_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("cc-01/check_hash");
    let hashes: Vec<_> = (0..256u32).map(|i| keccak256(&i.to_le_bytes())).collect();

    group.bench_function("random_hashes", |b| {
        b.iter(|| {
            hashes
                .iter()
                .filter(|h| check_hash_meets_difficulty(black_box(h), 1_000_000))
                .count()
        })
    });
    group.finish();
}
