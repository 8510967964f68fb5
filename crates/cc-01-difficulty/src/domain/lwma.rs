//! Linearly weighted moving average variants (hard forks 7 and later).
//!
//! For `N` solve times, solve time `i` (1 = oldest) is clamped and weighted by
//! `i`, so the most recent block counts most. The weighted sum `L` is
//! normalized by `k = N(N+1)/2` and floored at `k * T / 20`, which keeps a
//! burst of negative or zero solve times from driving it to zero.

use primitive_types::U256;

use super::algorithm::{DifficultyParams, JumpLimit};
use super::arith::mul128;
use super::errors::{DifficultyError, DifficultyResult};

/// Solve time from `previous` to `current`, clamped into
/// `[-max_negative_solve_time, max_solve_time]`.
fn clamped_solve_time(current: u64, previous: u64, params: &DifficultyParams) -> i64 {
    if current >= previous {
        (current - previous).min(params.max_solve_time) as i64
    } else {
        -((previous - current).min(params.max_negative_solve_time) as i64)
    }
}

/// Difficulty of block `index`, recovered from the cumulative sequence.
fn block_difficulty(cumulative_difficulties: &[u64], index: usize) -> DifficultyResult<u64> {
    let difficulty = cumulative_difficulties[index]
        .checked_sub(cumulative_difficulties[index - 1])
        .ok_or(DifficultyError::NonMonotonicCumulative { index })?;
    if difficulty == 0 {
        return Err(DifficultyError::ZeroBlockDifficulty { index });
    }
    Ok(difficulty)
}

/// `Σ i * clamp(solve_time_i)` floored at `floor`.
fn weighted_solve_time(timestamps: &[u64], params: &DifficultyParams, floor: u64) -> u64 {
    let weighted: i64 = (1..timestamps.len())
        .map(|i| clamped_solve_time(timestamps[i], timestamps[i - 1], params) * i as i64)
        .sum();
    if weighted < floor as i64 {
        floor
    } else {
        weighted as u64
    }
}

/// First generation: total work over weighted solve time.
///
/// `next = sum_D * T * (N + 1) / (2 * L)`, scaled by the variant's adjustment.
pub(crate) fn direct(
    timestamps: &[u64],
    cumulative_difficulties: &[u64],
    params: &DifficultyParams,
) -> DifficultyResult<u64> {
    let n = (timestamps.len() - 1) as u64;
    let target = params.target_seconds;

    let mut total_work: u64 = 0;
    for i in 1..timestamps.len() {
        let difficulty = block_difficulty(cumulative_difficulties, i)?;
        total_work = total_work
            .checked_add(difficulty)
            .ok_or(DifficultyError::Overflow)?;
    }

    let weighted = weighted_solve_time(timestamps, params, n * n * target / 20);

    let factor = target * (n + 1) * params.adjust_numerator;
    let divisor = 2 * params.adjust_denominator;
    let next = match mul128(total_work, factor) {
        (low, 0) => low / weighted / divisor,
        // Divide first when the product needs more than 64 bits.
        _ => (total_work / weighted)
            .checked_mul(factor)
            .ok_or(DifficultyError::Overflow)?
            / divisor,
    };
    Ok(next.max(1))
}

/// Later generations: harmonic mean of per-block difficulty over weighted
/// solve time, `next = H * T * k / L`, scaled by the variant's adjustment.
///
/// `H = N / Σ(1 / D_i)` is evaluated in 128.128 fixed point and never
/// rounded on its own; the whole quotient is taken once at the end.
pub(crate) fn harmonic(
    timestamps: &[u64],
    cumulative_difficulties: &[u64],
    params: &DifficultyParams,
) -> DifficultyResult<u64> {
    let n = (timestamps.len() - 1) as u64;
    let k = n * (n + 1) / 2;
    let target = params.target_seconds;
    let one = U256::one() << 128;

    let mut inverse_sum = U256::zero();
    for i in 1..timestamps.len() {
        let difficulty = block_difficulty(cumulative_difficulties, i)?;
        inverse_sum += one / U256::from(difficulty);
    }

    let weighted = weighted_solve_time(timestamps, params, k * target / 20);

    let numerator = U256::from(n) * one * U256::from(target * k * params.adjust_numerator);
    let denominator =
        inverse_sum * U256::from(weighted) * U256::from(params.adjust_denominator);
    let next = numerator / denominator;
    if next > U256::from(u64::MAX) {
        return Err(DifficultyError::Overflow);
    }
    let mut next = next.low_u64();

    if let Some(limit) = params.jump_limit {
        let previous = block_difficulty(cumulative_difficulties, timestamps.len() - 1)?;
        next = apply_jump_limit(next, previous, limit);
    }
    Ok(next.max(1))
}

/// `value * percent / 100` without overflowing, saturating at `u64::MAX`.
fn scale_percent(value: u64, percent: u64) -> u64 {
    (value / 100)
        .saturating_mul(percent)
        .saturating_add(value % 100 * percent / 100)
}

fn apply_jump_limit(next: u64, previous: u64, limit: JumpLimit) -> u64 {
    let lower = scale_percent(previous, limit.min_percent).max(1);
    let upper = scale_percent(previous, limit.max_percent).max(lower);
    next.clamp(lower, upper)
}
