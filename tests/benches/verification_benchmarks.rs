//! # Consensus-Core Benchmarks
//!
//! | Crate | Benchmark |
//! |-------|-----------|
//! | cc-01 Difficulty | `next_difficulty` per variant, hash/difficulty check |
//! | cc-02 Tx Verification | pipeline throughput, batch fallback cost |

use cc_tests::benchmarks::{cc_01_difficulty, cc_02_tx_verification};
use criterion::{criterion_group, criterion_main};

criterion_group!(
    difficulty,
    cc_01_difficulty::bench_next_difficulty,
    cc_01_difficulty::bench_check_hash
);
criterion_group!(
    tx_verification,
    cc_02_tx_verification::bench_verify_and_admit
);
criterion_main!(difficulty, tx_verification);
