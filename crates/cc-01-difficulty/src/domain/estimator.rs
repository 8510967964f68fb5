//! Version dispatch and the shared prelude of every variant.

use shared_types::{Difficulty, HardForkVersion};
use tracing::debug;

use super::algorithm::DifficultyAlgorithm;
use super::errors::{DifficultyError, DifficultyResult};
use super::{legacy, lwma};

/// Next required difficulty under the rules of `version`.
///
/// `timestamps` and `cumulative_difficulties` are parallel, oldest first.
/// Input longer than the variant window is truncated to its leading
/// entries; pass the last [`history_len`] blocks ending at the tip.
pub fn next_difficulty(
    timestamps: &[u64],
    cumulative_difficulties: &[u64],
    version: HardForkVersion,
) -> DifficultyResult<Difficulty> {
    let algorithm = DifficultyAlgorithm::for_version(version);
    algorithm
        .next_difficulty(timestamps, cumulative_difficulties)
        .map_err(|error| {
            debug!(
                hf_version = version,
                ?algorithm,
                samples = timestamps.len(),
                %error,
                "Difficulty computation failed"
            );
            error
        })
}

/// Number of most recent blocks to supply for `version`.
pub fn history_len(version: HardForkVersion) -> usize {
    DifficultyAlgorithm::for_version(version).history_len()
}

impl DifficultyAlgorithm {
    /// Next required difficulty under this variant.
    pub fn next_difficulty(
        self,
        timestamps: &[u64],
        cumulative_difficulties: &[u64],
    ) -> DifficultyResult<Difficulty> {
        if timestamps.len() != cumulative_difficulties.len() {
            return Err(DifficultyError::LengthMismatch {
                timestamps: timestamps.len(),
                cumulative_difficulties: cumulative_difficulties.len(),
            });
        }

        let params = self.params();
        let len = timestamps.len().min(params.window);
        if len < params.min_samples {
            return Ok(params.bootstrap_difficulty);
        }
        let timestamps = &timestamps[..len];
        let cumulative_difficulties = &cumulative_difficulties[..len];

        match self {
            Self::Legacy => legacy::next(timestamps, cumulative_difficulties, params),
            Self::Lwma1 => lwma::direct(timestamps, cumulative_difficulties, params),
            Self::Lwma2 | Self::Lwma3 => {
                lwma::harmonic(timestamps, cumulative_difficulties, params)
            }
        }
    }
}
