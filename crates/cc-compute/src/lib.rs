//! # CC-Compute: Fork-Join Work Pool
//!
//! A fixed set of worker threads plus a [`Waiter`] that joins a batch of
//! submitted tasks. The pool is the only source of parallelism in the
//! consensus core; the transaction verification pipeline fans its per-blob
//! work out through it.
//!
//! ## Scheduling Rules
//!
//! | Submission | Caller context | Outcome |
//! |------------|----------------|---------|
//! | any | running a leaf task | fatal: panic (abort inside the pool) |
//! | leaf | anywhere else | queued at the front |
//! | non-leaf | nested (`depth > 0`) | runs inline on the caller |
//! | non-leaf | pool saturated | runs inline on the caller |
//! | any | pool stopped | runs inline on the caller |
//! | non-leaf | otherwise | queued at the back |
//!
//! "Saturated" means every worker is busy and the backlog is non-empty.
//! Inline execution bounds recursion and keeps a fork-join batch from
//! waiting on sub-tasks that no free thread could ever pick up.
//!
//! The nesting state lives in an explicit [`TaskContext`] handed to every
//! task body and passed back into [`WorkPool::submit`] and [`Waiter::wait`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cc_compute::{TaskContext, WorkPool};
//!
//! let pool = WorkPool::with_default_size()?;
//! let ctx = TaskContext::root();
//! let waiter = pool.waiter();
//! for chunk in chunks {
//!     pool.submit(&ctx, Some(&waiter), move |_| process(chunk), true);
//! }
//! waiter.wait(&ctx)?;
//! ```

pub mod config;
pub mod metrics;
pub mod pool;

pub use config::PoolConfig;
pub use pool::{PoolStats, TaskContext, Waiter, WorkPool};
pub use shared_types::ConfigError;

use thiserror::Error;

/// Work pool errors
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Invalid pool configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to spawn pool worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("{failures} pool task(s) failed")]
    TaskFailed { failures: usize },
}

/// Error returned by a task body.
///
/// Recorded on the task's waiter; the worker that ran the task keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("Task failed: {0}")]
    Failed(String),
}

impl TaskError {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}
