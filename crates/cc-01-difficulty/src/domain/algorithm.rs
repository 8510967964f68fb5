//! Difficulty algorithm variants and their pinned constants.
//!
//! Changing any constant of an already-deployed variant changes which
//! historical blocks validate. New rules get a new variant and a new
//! hard-fork version.

use shared_types::HardForkVersion;

/// Target spacing between blocks, in seconds.
pub const DIFFICULTY_TARGET_SECONDS: u64 = 120;

/// Upper bound on how far ahead of the node's clock a block timestamp may be.
pub const BLOCK_FUTURE_TIME_LIMIT: u64 = 60 * 60 * 2;

/// Future time limit in force from the third LWMA generation onward.
pub const BLOCK_FUTURE_TIME_LIMIT_V3: u64 = 60 * 5;

/// Bounds on the next difficulty relative to the last block's difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpLimit {
    /// Lower bound, in percent of the previous difficulty
    pub min_percent: u64,
    /// Upper bound, in percent of the previous difficulty
    pub max_percent: u64,
}

/// Constants of one algorithm variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyParams {
    /// Target block spacing `T` in seconds
    pub target_seconds: u64,
    /// Samples considered; longer input is truncated to its leading entries
    pub window: usize,
    /// Extra trailing blocks callers fetch beyond the window
    pub lag: usize,
    /// Outliers trimmed from each end of the sorted timestamps (legacy only)
    pub cut: usize,
    /// Histories shorter than this return `bootstrap_difficulty`
    pub min_samples: usize,
    pub bootstrap_difficulty: u64,
    /// Magnitude of the most negative solve time counted
    pub max_negative_solve_time: u64,
    /// Largest solve time counted
    pub max_solve_time: u64,
    /// Result scaling `numerator / denominator`, compensating LWMA bias
    pub adjust_numerator: u64,
    pub adjust_denominator: u64,
    pub jump_limit: Option<JumpLimit>,
}

const LEGACY: DifficultyParams = DifficultyParams {
    target_seconds: DIFFICULTY_TARGET_SECONDS,
    window: 720,
    lag: 15,
    cut: 60,
    min_samples: 2,
    bootstrap_difficulty: 1,
    max_negative_solve_time: 0,
    max_solve_time: 0,
    adjust_numerator: 1,
    adjust_denominator: 1,
    jump_limit: None,
};

const LWMA1: DifficultyParams = DifficultyParams {
    target_seconds: DIFFICULTY_TARGET_SECONDS,
    window: 61,
    lag: 0,
    cut: 0,
    min_samples: 11,
    bootstrap_difficulty: 100,
    max_negative_solve_time: BLOCK_FUTURE_TIME_LIMIT,
    max_solve_time: 6 * DIFFICULTY_TARGET_SECONDS,
    adjust_numerator: 99,
    adjust_denominator: 100,
    jump_limit: None,
};

const LWMA2: DifficultyParams = DifficultyParams {
    target_seconds: DIFFICULTY_TARGET_SECONDS,
    window: 60,
    lag: 0,
    cut: 0,
    min_samples: 4,
    bootstrap_difficulty: 1,
    max_negative_solve_time: 7 * DIFFICULTY_TARGET_SECONDS,
    max_solve_time: 7 * DIFFICULTY_TARGET_SECONDS,
    adjust_numerator: 998,
    adjust_denominator: 1000,
    jump_limit: None,
};

const LWMA3: DifficultyParams = DifficultyParams {
    target_seconds: DIFFICULTY_TARGET_SECONDS,
    window: 60,
    lag: 0,
    cut: 0,
    min_samples: 4,
    bootstrap_difficulty: 1,
    max_negative_solve_time: BLOCK_FUTURE_TIME_LIMIT_V3,
    max_solve_time: 7 * DIFFICULTY_TARGET_SECONDS,
    adjust_numerator: 998,
    adjust_denominator: 1000,
    jump_limit: Some(JumpLimit {
        min_percent: 80,
        max_percent: 120,
    }),
};

/// The closed set of difficulty algorithms, keyed by hard-fork version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DifficultyAlgorithm {
    /// Windowed average over sorted timestamps with outliers cut.
    Legacy,
    /// LWMA, total work over weighted solve time.
    Lwma1,
    /// LWMA, harmonic mean of per-block difficulty.
    Lwma2,
    /// `Lwma2` with the result bounded relative to the last block.
    Lwma3,
}

impl DifficultyAlgorithm {
    pub const ALL: [DifficultyAlgorithm; 4] = [
        DifficultyAlgorithm::Legacy,
        DifficultyAlgorithm::Lwma1,
        DifficultyAlgorithm::Lwma2,
        DifficultyAlgorithm::Lwma3,
    ];

    /// Variant in force at `version`.
    pub fn for_version(version: HardForkVersion) -> Self {
        match version {
            0..=6 => Self::Legacy,
            7..=9 => Self::Lwma1,
            10..=11 => Self::Lwma2,
            _ => Self::Lwma3,
        }
    }

    pub fn params(self) -> &'static DifficultyParams {
        match self {
            Self::Legacy => &LEGACY,
            Self::Lwma1 => &LWMA1,
            Self::Lwma2 => &LWMA2,
            Self::Lwma3 => &LWMA3,
        }
    }

    /// Number of most recent blocks a caller should supply.
    pub fn history_len(self) -> usize {
        let params = self.params();
        params.window + params.lag
    }
}
