//! # CC-02 Transaction Verification Benchmarks
//!
//! Whole-pipeline throughput for batches of valid transactions, and the
//! cost of a batch that needs the per-record fallback.

use std::sync::Arc;

use cc_02_tx_verification::test_utils::{InMemoryChain, InMemoryMempool, TxBuilder};
use cc_02_tx_verification::{
    TransactionVerificationApi, TransactionVerificationService, VerifierConfig,
};
use cc_compute::{PoolConfig, WorkPool};
use criterion::{black_box, BenchmarkId, Criterion, Throughput};

type Verifier = TransactionVerificationService<Arc<InMemoryChain>, Arc<InMemoryMempool>>;

/// A fresh verifier per iteration, so nothing is already known.
fn verifier(pool: &Arc<WorkPool>) -> Verifier {
    TransactionVerificationService::new(
        Arc::new(InMemoryChain::default()),
        Arc::new(InMemoryMempool::default()),
        Arc::clone(pool),
        VerifierConfig::default(),
    )
    .expect("default config is valid")
}

fn blobs(count: usize, forged: Option<usize>) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| {
            let builder = TxBuilder::new(i as u64).with_inputs(2);
            if Some(i) == forged {
                builder.tamper_signature(1).build().blob
            } else {
                builder.build().blob
            }
        })
        .collect()
}

pub fn bench_verify_and_admit(c: &mut Criterion) {
    let mut group = c.benchmark_group("cc-02/verify_and_admit");
    let pool = Arc::new(WorkPool::with_default_size().expect("pool starts"));

    for size in [1usize, 16, 64, 256] {
        let batch = blobs(size, None);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("valid", size), &batch, |b, batch| {
            b.iter_with_setup(
                || verifier(&pool),
                |v| black_box(v.verify_and_admit(batch, false)),
            )
        });
    }

    for size in [16usize, 64] {
        let batch = blobs(size, Some(size / 2));
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("one_forged", size), &batch, |b, batch| {
            b.iter_with_setup(
                || verifier(&pool),
                |v| black_box(v.verify_and_admit(batch, false)),
            )
        });
    }
    group.finish();
}
