//! # Difficulty Estimator (CC-01)
//!
//! Computes the proof-of-work difficulty required of the next block from the
//! timestamps and cumulative difficulties of recent blocks, and checks a
//! block hash against a difficulty.
//!
//! ## Algorithm Family
//!
//! Every hard-fork version maps to exactly one [`DifficultyAlgorithm`]. Each
//! variant carries its constants as a [`DifficultyParams`] table so that the
//! rules of already-deployed versions stay auditable and unchanged.
//!
//! | Versions | Variant | Samples | Bootstrap |
//! |----------|---------|---------|-----------|
//! | 0..=6 | `Legacy` (sorted, outlier cut) | 720 | `1` below 2 samples |
//! | 7..=9 | `Lwma1` (direct ratio) | 61 | `100` below 11 samples |
//! | 10..=11 | `Lwma2` (harmonic mean) | 60 | `1` below 4 samples |
//! | 12.. | `Lwma3` (harmonic mean, jump limit) | 60 | `1` below 4 samples |
//!
//! ## Determinism
//!
//! All arithmetic is on unsigned 64-bit limbs: products are widened with
//! [`mul128`] and the harmonic mean uses 256-bit fixed point. A computation
//! that would overflow or degenerate returns a [`DifficultyError`]; `Ok(0)`
//! is never produced.

pub mod domain;

pub use domain::algorithm::{DifficultyAlgorithm, DifficultyParams, JumpLimit};
pub use domain::arith::{check_hash_meets_difficulty, mul128};
pub use domain::errors::{DifficultyError, DifficultyResult};
pub use domain::estimator::{history_len, next_difficulty};
pub use domain::algorithm::DIFFICULTY_TARGET_SECONDS;
