//! # Verification Metrics
//!
//! Prometheus counters for the verification pipeline.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! cc-02-tx-verification = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `txverify_batches_total` - Counter of `verify_and_admit` calls
//! - `txverify_accepted_total` - Counter of transactions admitted to the mempool
//! - `txverify_already_known_total` - Counter of transactions already in chain or pool
//! - `txverify_rejected_total` - Counter of rejected transactions (by reason)
//! - `txverify_batch_fallbacks_total` - Counter of failed batch equations that fell back to per-record checks

use crate::domain::entities::BatchVerdict;

#[cfg(feature = "metrics")]
use crate::domain::entities::TxVerdict;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total verification calls
    pub static ref BATCHES: IntCounter = register_int_counter!(
        "txverify_batches_total",
        "Total number of transaction batches verified"
    )
    .expect("Failed to create BATCHES metric");

    /// Total transactions admitted
    pub static ref ACCEPTED: IntCounter = register_int_counter!(
        "txverify_accepted_total",
        "Total number of transactions admitted to the mempool"
    )
    .expect("Failed to create ACCEPTED metric");

    /// Total transactions found in chain or pool
    pub static ref ALREADY_KNOWN: IntCounter = register_int_counter!(
        "txverify_already_known_total",
        "Total number of transactions already known"
    )
    .expect("Failed to create ALREADY_KNOWN metric");

    /// Total transactions rejected, labeled by reason
    pub static ref REJECTED: IntCounterVec = register_int_counter_vec!(
        "txverify_rejected_total",
        "Total number of transactions rejected",
        &["reason"]
    )
    .expect("Failed to create REJECTED metric");

    /// Total batch signature failures checked record by record
    pub static ref BATCH_FALLBACKS: IntCounter = register_int_counter!(
        "txverify_batch_fallbacks_total",
        "Total number of batch signature failures that fell back to individual checks"
    )
    .expect("Failed to create BATCH_FALLBACKS metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record the per-record outcomes of one verification call
#[cfg(feature = "metrics")]
pub fn record_batch(verdict: &BatchVerdict) {
    BATCHES.inc();
    for v in verdict.verdicts() {
        match v {
            TxVerdict::Accepted => ACCEPTED.inc(),
            TxVerdict::AlreadyKnown => ALREADY_KNOWN.inc(),
            TxVerdict::Rejected(rejection) => {
                REJECTED.with_label_values(&[rejection.label()]).inc()
            }
        }
    }
}

/// Record a failed batch equation
#[cfg(feature = "metrics")]
pub fn record_batch_fallback() {
    BATCH_FALLBACKS.inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_batch(_verdict: &BatchVerdict) {}

#[cfg(not(feature = "metrics"))]
pub fn record_batch_fallback() {}
