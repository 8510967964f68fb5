//! # Pool Metrics
//!
//! Prometheus counters for the work pool. [`crate::PoolStats`] stays the
//! per-pool snapshot; these counters aggregate every pool in the process.
//!
//! Enable with the `metrics` feature.
//!
//! ## Metrics Exported
//!
//! - `pool_tasks_completed_total` - Counter of tasks that returned `Ok`
//! - `pool_tasks_failed_total` - Counter of tasks that returned an error or panicked
//! - `pool_tasks_inlined_total` - Counter of submissions run on the submitting thread
//! - `pool_tasks_dropped_total` - Counter of queued tasks dropped at shutdown

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, IntCounter};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref TASKS_COMPLETED: IntCounter = register_int_counter!(
        "pool_tasks_completed_total",
        "Total number of pool tasks completed"
    )
    .expect("Failed to create TASKS_COMPLETED metric");

    pub static ref TASKS_FAILED: IntCounter = register_int_counter!(
        "pool_tasks_failed_total",
        "Total number of pool tasks that failed or panicked"
    )
    .expect("Failed to create TASKS_FAILED metric");

    pub static ref TASKS_INLINED: IntCounter = register_int_counter!(
        "pool_tasks_inlined_total",
        "Total number of pool submissions run inline"
    )
    .expect("Failed to create TASKS_INLINED metric");

    pub static ref TASKS_DROPPED: IntCounter = register_int_counter!(
        "pool_tasks_dropped_total",
        "Total number of queued pool tasks dropped at shutdown"
    )
    .expect("Failed to create TASKS_DROPPED metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_task_completed() {
    TASKS_COMPLETED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_task_failed() {
    TASKS_FAILED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_task_inlined() {
    TASKS_INLINED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_tasks_dropped(count: usize) {
    TASKS_DROPPED.inc_by(count as u64);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_task_completed() {}

#[cfg(not(feature = "metrics"))]
pub fn record_task_failed() {}

#[cfg(not(feature = "metrics"))]
pub fn record_task_inlined() {}

#[cfg(not(feature = "metrics"))]
pub fn record_tasks_dropped(_count: usize) {}
