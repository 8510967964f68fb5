//! # Difficulty Errors

use thiserror::Error;

/// Reasons a next-difficulty computation can fail.
///
/// Every variant is a degenerate or malformed history; callers validating a
/// block treat it as a rejection of that block.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DifficultyError {
    #[error(
        "History length mismatch: {timestamps} timestamps, {cumulative_difficulties} cumulative difficulties"
    )]
    LengthMismatch {
        timestamps: usize,
        cumulative_difficulties: usize,
    },

    /// Cumulative difficulty must never decrease.
    #[error("Cumulative difficulty decreases at index {index}")]
    NonMonotonicCumulative { index: usize },

    #[error("Block at index {index} has zero difficulty")]
    ZeroBlockDifficulty { index: usize },

    #[error("No work in the difficulty window")]
    ZeroTotalWork,

    #[error("Difficulty computation overflowed")]
    Overflow,
}

/// Result type for difficulty computations.
pub type DifficultyResult<T> = Result<T, DifficultyError>;
