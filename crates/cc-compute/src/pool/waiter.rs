//! Fork-join handle for one batch of pool tasks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use super::{PoolShared, TaskContext};
use crate::PoolError;

/// Outstanding-task counter shared between a [`Waiter`] and its queued entries.
#[derive(Default)]
pub(crate) struct WaiterState {
    pending: Mutex<usize>,
    done: Condvar,
    failures: AtomicUsize,
}

impl WaiterState {
    pub(crate) fn register(&self) {
        *self.pending.lock() += 1;
    }

    pub(crate) fn complete_one(&self) {
        let mut pending = self.pending.lock();
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            self.done.notify_all();
        }
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::AcqRel);
    }

    fn pending(&self) -> usize {
        *self.pending.lock()
    }
}

/// Joins every task submitted with it.
///
/// Dropping a waiter with outstanding tasks blocks until they finish, so no
/// queued entry can outlive the batch that created it.
pub struct Waiter {
    pub(crate) state: Arc<WaiterState>,
    pool: Arc<PoolShared>,
}

impl Waiter {
    pub(crate) fn new(pool: Arc<PoolShared>) -> Self {
        Self {
            state: Arc::new(WaiterState::default()),
            pool,
        }
    }

    /// Block until every task submitted with this waiter has finished.
    ///
    /// The calling thread drains the pool queue while tasks are outstanding,
    /// so a batch submitted from a non-worker thread makes progress even when
    /// every worker is busy. Returns `PoolError::TaskFailed` if any task of
    /// the batch returned an error, panicked, or was dropped at shutdown.
    pub fn wait(&self, ctx: &TaskContext) -> Result<(), PoolError> {
        while self.state.pending() > 0 {
            match self.pool.claim() {
                Some(entry) => {
                    self.pool.execute(entry, ctx);
                    self.pool.release();
                }
                None => break,
            }
        }

        let mut pending = self.state.pending.lock();
        while *pending > 0 {
            self.state.done.wait(&mut pending);
        }
        drop(pending);

        match self.failures() {
            0 => Ok(()),
            failures => Err(PoolError::TaskFailed { failures }),
        }
    }

    /// Tasks submitted with this waiter that have not finished yet.
    pub fn pending(&self) -> usize {
        self.state.pending()
    }

    /// Tasks of this batch that failed so far.
    pub fn failures(&self) -> usize {
        self.state.failures.load(Ordering::Acquire)
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        if self.state.pending() > 0 {
            debug!(
                pending = self.state.pending(),
                "Waiter dropped with outstanding tasks, joining"
            );
            if let Err(e) = self.wait(&TaskContext::ROOT) {
                warn!(error = %e, failures = self.failures(), "Waiter dropped with failed tasks");
            }
        }
    }
}
