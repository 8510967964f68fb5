//! Windowed average with outlier cut (hard forks 0..=6).

use super::algorithm::DifficultyParams;
use super::arith::mul128;
use super::errors::{DifficultyError, DifficultyResult};

/// `total_work * T / time_span`, rounded up, over the middle of the window.
///
/// Timestamps are sorted and `cut` samples are trimmed from each end once
/// the window is full. The trimmed positions are then applied to
/// `cumulative_difficulties` as given, without following the timestamps
/// through the sort. Deployed chains validated with exactly this pairing, so
/// it stays even though it does not track which block each timestamp came
/// from when miners reorder timestamps.
pub(crate) fn next(
    timestamps: &[u64],
    cumulative_difficulties: &[u64],
    params: &DifficultyParams,
) -> DifficultyResult<u64> {
    let length = timestamps.len();
    let mut sorted = timestamps.to_vec();
    sorted.sort_unstable();

    let kept = params.window - 2 * params.cut;
    let (cut_begin, cut_end) = if length <= kept {
        (0, length)
    } else {
        let begin = (length - kept + 1) / 2;
        (begin, begin + kept)
    };

    let time_span = (sorted[cut_end - 1] - sorted[cut_begin]).max(1);

    let total_work = cumulative_difficulties[cut_end - 1]
        .checked_sub(cumulative_difficulties[cut_begin])
        .ok_or(DifficultyError::NonMonotonicCumulative { index: cut_end - 1 })?;
    if total_work == 0 {
        return Err(DifficultyError::ZeroTotalWork);
    }

    let (low, high) = mul128(total_work, params.target_seconds);
    if high != 0 {
        return Err(DifficultyError::Overflow);
    }
    let rounded = low
        .checked_add(time_span - 1)
        .ok_or(DifficultyError::Overflow)?;
    Ok(rounded / time_span)
}
