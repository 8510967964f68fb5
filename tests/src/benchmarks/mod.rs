//! # Consensus-Core Benchmarks
//!
//! Benchmark bodies, registered by `benches/verification_benchmarks.rs`.

pub mod cc_01_difficulty;
pub mod cc_02_tx_verification;
