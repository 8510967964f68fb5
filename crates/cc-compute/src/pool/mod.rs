//! Worker threads, the shared task queue and the scheduling decision.

mod context;
mod map;
mod waiter;

pub use context::TaskContext;
pub use waiter::Waiter;

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, trace, warn};

use crate::{metrics, PoolConfig, PoolError, TaskError};
use waiter::WaiterState;

/// Boxed task body.
pub(crate) type Job = Box<dyn FnOnce(&TaskContext) -> Result<(), TaskError> + Send + 'static>;

/// Panic payload raised when a leaf task submits work.
struct LeafSubmission;

pub(crate) struct TaskEntry {
    job: Job,
    waiter: Option<Arc<WaiterState>>,
    leaf: bool,
}

// =============================================================================
// SHARED STATE
// =============================================================================

struct PoolState {
    queue: VecDeque<TaskEntry>,
    active: usize,
    max: usize,
    running: bool,
}

impl PoolState {
    fn is_saturated(&self) -> bool {
        self.active >= self.max && !self.queue.is_empty()
    }

    fn accepts_work(&self) -> bool {
        self.running && self.max > 0
    }
}

/// Queue and counters shared by the pool handle, its workers and its waiters.
pub(crate) struct PoolShared {
    state: Mutex<PoolState>,
    has_work: Condvar,
    completed: AtomicU64,
    failed: AtomicU64,
    inlined: AtomicU64,
}

impl PoolShared {
    fn new() -> Self {
        Self {
            state: Mutex::new(PoolState {
                queue: VecDeque::with_capacity(32),
                active: 0,
                max: 0,
                running: false,
            }),
            has_work: Condvar::new(),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            inlined: AtomicU64::new(0),
        }
    }

    /// Take the next queued entry and count it as active until [`Self::release`].
    pub(crate) fn claim(&self) -> Option<TaskEntry> {
        let mut state = self.state.lock();
        let entry = state.queue.pop_front()?;
        state.active += 1;
        Some(entry)
    }

    pub(crate) fn release(&self) {
        let mut state = self.state.lock();
        state.active = state.active.saturating_sub(1);
    }

    /// Run one entry one level below `caller`, then settle its waiter.
    pub(crate) fn execute(&self, entry: TaskEntry, caller: &TaskContext) {
        let TaskEntry { job, waiter, leaf } = entry;
        let ctx = caller.enter(leaf);

        let failed = match panic::catch_unwind(AssertUnwindSafe(|| job(&ctx))) {
            Ok(Ok(())) => false,
            Ok(Err(error)) => {
                warn!(depth = ctx.depth(), leaf, %error, "Pool task returned an error");
                true
            }
            Err(payload) => {
                if payload.is::<LeafSubmission>() {
                    error!(
                        depth = ctx.depth(),
                        "Leaf task submitted work to the pool, aborting"
                    );
                    std::process::abort();
                }
                error!(
                    depth = ctx.depth(),
                    leaf,
                    panic = %panic_message(payload.as_ref()),
                    "Pool task panicked"
                );
                true
            }
        };

        if failed {
            self.failed.fetch_add(1, Ordering::Relaxed);
            metrics::record_task_failed();
            if let Some(waiter) = &waiter {
                waiter.record_failure();
            }
        } else {
            self.completed.fetch_add(1, Ordering::Relaxed);
            metrics::record_task_completed();
        }

        if let Some(waiter) = waiter {
            waiter.complete_one();
        }
    }

    fn worker_loop(self: Arc<Self>, id: usize) {
        trace!(worker = id, "Pool worker started");
        loop {
            let entry = {
                let mut state = self.state.lock();
                loop {
                    if !state.running {
                        trace!(worker = id, "Pool worker stopping");
                        return;
                    }
                    if let Some(entry) = state.queue.pop_front() {
                        state.active += 1;
                        break entry;
                    }
                    self.has_work.wait(&mut state);
                }
            };

            self.execute(entry, &TaskContext::ROOT);
            self.release();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// =============================================================================
// POOL HANDLE
// =============================================================================

/// Snapshot of pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub threads: usize,
    pub running: bool,
    pub active: usize,
    pub queued: usize,
    pub completed: u64,
    pub failed: u64,
    pub inlined: u64,
}

/// Fixed-size worker pool.
pub struct WorkPool {
    shared: Arc<PoolShared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    threads: usize,
}

impl WorkPool {
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;

        let pool = Self {
            shared: Arc::new(PoolShared::new()),
            workers: Mutex::new(Vec::with_capacity(config.threads)),
            threads: config.threads,
        };
        pool.spawn_workers()?;

        info!(threads = pool.threads, "Work pool started");
        Ok(pool)
    }

    /// Pool sized to the detected hardware concurrency.
    pub fn with_default_size() -> Result<Self, PoolError> {
        Self::new(PoolConfig::default())
    }

    fn spawn_workers(&self) -> Result<(), PoolError> {
        let mut workers = self.workers.lock();
        {
            let mut state = self.shared.state.lock();
            state.running = true;
            state.max = self.threads;
        }

        for id in 0..self.threads {
            let shared = Arc::clone(&self.shared);
            let handle = thread::Builder::new()
                .name(format!("cc-pool-{}", id))
                .spawn(move || shared.worker_loop(id));

            match handle {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    drop(workers);
                    error!(worker = id, error = %e, "Failed to spawn pool worker");
                    self.shutdown();
                    return Err(PoolError::Spawn(e));
                }
            }
        }
        Ok(())
    }

    /// Create a waiter that joins tasks submitted to this pool.
    pub fn waiter(&self) -> Waiter {
        Waiter::new(Arc::clone(&self.shared))
    }

    /// Submit `job`, either to the queue or inline on the calling thread.
    ///
    /// `ctx` is the caller's context: [`TaskContext::root`] outside the pool,
    /// or the context a task body received when submitting from inside one.
    ///
    /// # Panics
    ///
    /// If `ctx` belongs to a leaf task. Inside the pool this aborts the
    /// process instead of unwinding.
    pub fn submit<F>(&self, ctx: &TaskContext, waiter: Option<&Waiter>, job: F, leaf: bool)
    where
        F: FnOnce(&TaskContext) -> Result<(), TaskError> + Send + 'static,
    {
        if ctx.is_leaf() {
            error!(
                depth = ctx.depth(),
                "Leaf task attempted to submit work to the pool"
            );
            panic::panic_any(LeafSubmission);
        }

        let waiter = waiter.map(|w| Arc::clone(&w.state));
        if let Some(waiter) = &waiter {
            waiter.register();
        }
        let entry = TaskEntry {
            job: Box::new(job),
            waiter,
            leaf,
        };

        let mut state = self.shared.state.lock();
        // Nothing drains the queue of a stopped pool, so even leaves run here.
        let inline = !state.accepts_work()
            || (!leaf && (ctx.is_nested() || state.is_saturated()));
        if inline {
            drop(state);
            trace!(depth = ctx.depth(), leaf, "Running pool task inline");
            self.shared.inlined.fetch_add(1, Ordering::Relaxed);
            metrics::record_task_inlined();
            self.shared.execute(entry, ctx);
            return;
        }

        if leaf {
            state.queue.push_front(entry);
        } else {
            state.queue.push_back(entry);
        }
        drop(state);
        self.shared.has_work.notify_one();
    }

    /// Stop and join every worker. Safe to call more than once.
    ///
    /// Tasks still queued are dropped; their waiters are released and
    /// flagged as failed.
    pub fn shutdown(&self) {
        let dropped: Vec<TaskEntry> = {
            let mut state = self.shared.state.lock();
            state.running = false;
            state.queue.drain(..).collect()
        };
        self.shared.has_work.notify_all();

        if !dropped.is_empty() {
            warn!(dropped = dropped.len(), "Dropping queued tasks on shutdown");
            metrics::record_tasks_dropped(dropped.len());
        }
        for entry in dropped {
            if let Some(waiter) = entry.waiter {
                waiter.record_failure();
                waiter.complete_one();
            }
        }

        let handles = std::mem::take(&mut *self.workers.lock());
        let current = thread::current().id();
        let joined = handles.len();
        for handle in handles {
            // A worker dropping the last pool handle cannot join itself.
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                error!("Pool worker terminated by panic");
            }
        }

        if joined > 0 {
            debug!(workers = joined, "Work pool stopped");
        }
    }

    /// Shut down and respawn the same number of workers.
    pub fn recycle(&self) -> Result<(), PoolError> {
        self.shutdown();
        self.spawn_workers()?;
        info!(threads = self.threads, "Work pool recycled");
        Ok(())
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.shared.state.lock();
        PoolStats {
            threads: self.threads,
            running: state.running,
            active: state.active,
            queued: state.queue.len(),
            completed: self.shared.completed.load(Ordering::Relaxed),
            failed: self.shared.failed.load(Ordering::Relaxed),
            inlined: self.shared.inlined.load(Ordering::Relaxed),
        }
    }
}

impl Drop for WorkPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::time::Duration;

    fn pool(threads: usize) -> Arc<WorkPool> {
        Arc::new(WorkPool::new(PoolConfig::with_threads(threads)).unwrap())
    }

    #[test]
    fn test_submit_and_wait_runs_every_task() {
        let pool = pool(4);
        let ctx = TaskContext::root();
        let counter = Arc::new(AtomicUsize::new(0));

        let waiter = pool.waiter();
        for _ in 0..64 {
            let counter = Arc::clone(&counter);
            pool.submit(
                &ctx,
                Some(&waiter),
                move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
                false,
            );
        }
        waiter.wait(&ctx).unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 64);
        assert_eq!(waiter.pending(), 0);
    }

    #[test]
    fn test_task_error_is_reported_on_waiter() {
        let pool = pool(2);
        let ctx = TaskContext::root();

        let waiter = pool.waiter();
        pool.submit(&ctx, Some(&waiter), |_| Ok(()), true);
        pool.submit(&ctx, Some(&waiter), |_| Err(TaskError::failed("boom")), true);

        let err = waiter.wait(&ctx).unwrap_err();
        assert!(matches!(err, PoolError::TaskFailed { failures: 1 }));
    }

    #[test]
    fn test_worker_survives_panicking_task() {
        let pool = pool(1);
        let ctx = TaskContext::root();

        let waiter = pool.waiter();
        pool.submit(&ctx, Some(&waiter), |_| panic!("task blew up"), true);
        assert!(waiter.wait(&ctx).is_err());

        let ran = Arc::new(AtomicUsize::new(0));
        let after = pool.waiter();
        let flag = Arc::clone(&ran);
        pool.submit(
            &ctx,
            Some(&after),
            move |_| {
                flag.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            true,
        );
        after.wait(&ctx).unwrap();

        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(pool.stats().failed, 1);
    }

    #[test]
    fn test_nested_submission_runs_inline_on_same_thread() {
        let pool = pool(2);
        let ctx = TaskContext::root();
        let (tx, rx) = mpsc::channel();

        let waiter = pool.waiter();
        let inner_pool = Arc::clone(&pool);
        pool.submit(
            &ctx,
            Some(&waiter),
            move |ctx| {
                let parent = thread::current().id();
                let calls = Arc::new(AtomicUsize::new(0));
                let nested = inner_pool.waiter();
                for expected in 1..=3 {
                    let counter = Arc::clone(&calls);
                    let tx = tx.clone();
                    inner_pool.submit(
                        ctx,
                        Some(&nested),
                        move |inner| {
                            counter.fetch_add(1, Ordering::SeqCst);
                            let _ = tx.send((thread::current().id() == parent, inner.depth()));
                            Ok(())
                        },
                        false,
                    );
                    // Inline execution has already happened by the time submit returns.
                    if calls.load(Ordering::SeqCst) != expected {
                        return Err(TaskError::failed("nested task was queued"));
                    }
                }
                nested
                    .wait(ctx)
                    .map_err(|e| TaskError::failed(e.to_string()))
            },
            false,
        );
        waiter.wait(&ctx).unwrap();

        let observed: Vec<(bool, usize)> = rx.try_iter().collect();
        assert_eq!(observed, vec![(true, 2); 3]);
        assert!(pool.stats().inlined >= 3);
    }

    #[test]
    fn test_saturated_pool_runs_top_level_work_inline() {
        let pool = pool(1);
        let ctx = TaskContext::root();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let waiter = pool.waiter();
        // Occupy the only worker.
        pool.submit(
            &ctx,
            Some(&waiter),
            move |_| {
                let _ = started_tx.send(());
                let _ = release_rx.recv();
                Ok(())
            },
            false,
        );
        started_rx.recv_timeout(Duration::from_secs(10)).unwrap();

        // Queue is empty, so this one is queued behind the busy worker.
        pool.submit(&ctx, Some(&waiter), |_| Ok(()), false);
        assert_eq!(pool.stats().queued, 1);

        // Worker busy and backlog non-empty: this one runs right here.
        let caller = thread::current().id();
        let ran_here = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&ran_here);
        pool.submit(
            &ctx,
            Some(&waiter),
            move |_| {
                if thread::current().id() == caller {
                    flag.fetch_add(1, Ordering::SeqCst);
                }
                Ok(())
            },
            false,
        );
        assert_eq!(ran_here.load(Ordering::SeqCst), 1);

        release_tx.send(()).unwrap();
        waiter.wait(&ctx).unwrap();
    }

    #[test]
    fn test_leaf_entries_jump_the_queue() {
        let pool = pool(1);
        let ctx = TaskContext::root();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let order = Arc::new(Mutex::new(Vec::new()));

        let busy = pool.waiter();
        pool.submit(
            &ctx,
            Some(&busy),
            move |_| {
                let _ = started_tx.send(());
                let _ = release_rx.recv();
                Ok(())
            },
            false,
        );
        started_rx.recv_timeout(Duration::from_secs(10)).unwrap();

        let labeled = pool.waiter();
        for (label, leaf) in [("first", false), ("leaf", true)] {
            let order = Arc::clone(&order);
            pool.submit(
                &ctx,
                Some(&labeled),
                move |_| {
                    order.lock().push(label);
                    Ok(())
                },
                leaf,
            );
        }
        // The only worker is still blocked, so this thread drains the queue in order.
        labeled.wait(&ctx).unwrap();
        release_tx.send(()).unwrap();
        busy.wait(&ctx).unwrap();

        assert_eq!(*order.lock(), vec!["leaf", "first"]);
    }

    #[test]
    #[should_panic]
    fn test_leaf_context_cannot_submit() {
        let pool = pool(1);
        let leaf_ctx = TaskContext::root().enter(true);
        pool.submit(&leaf_ctx, None, |_| Ok(()), true);
    }

    #[test]
    fn test_shutdown_is_idempotent_and_inlines_afterwards() {
        let pool = pool(2);
        pool.shutdown();
        pool.shutdown();
        assert!(!pool.stats().running);

        let ctx = TaskContext::root();
        let ran = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&ran);
        pool.submit(
            &ctx,
            None,
            move |_| {
                flag.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            false,
        );
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_leaf_after_shutdown_runs_inline() {
        let pool = pool(2);
        pool.shutdown();

        let ctx = TaskContext::root();
        let caller = thread::current().id();
        let ran_here = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&ran_here);
        pool.submit(
            &ctx,
            None,
            move |inner| {
                if thread::current().id() == caller && inner.is_leaf() {
                    flag.fetch_add(1, Ordering::SeqCst);
                }
                Ok(())
            },
            true,
        );

        assert_eq!(ran_here.load(Ordering::SeqCst), 1);
        let stats = pool.stats();
        assert_eq!(stats.queued, 0);
        assert_eq!(stats.inlined, 1);
    }

    #[test]
    fn test_tasks_drained_by_waiter_count_as_active() {
        let pool = pool(1);
        let ctx = TaskContext::root();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let busy = pool.waiter();
        pool.submit(
            &ctx,
            Some(&busy),
            move |_| {
                let _ = started_tx.send(());
                let _ = release_rx.recv();
                Ok(())
            },
            false,
        );
        started_rx.recv_timeout(Duration::from_secs(10)).unwrap();

        let observed = Arc::new(AtomicUsize::new(0));
        let drained = pool.waiter();
        let inner_pool = Arc::clone(&pool);
        let seen = Arc::clone(&observed);
        pool.submit(
            &ctx,
            Some(&drained),
            move |_| {
                seen.store(inner_pool.stats().active, Ordering::SeqCst);
                Ok(())
            },
            true,
        );
        // The only worker is blocked, so this thread runs the queued leaf.
        drained.wait(&ctx).unwrap();

        assert_eq!(observed.load(Ordering::SeqCst), 2);
        assert_eq!(pool.stats().active, 1);
        release_tx.send(()).unwrap();
        busy.wait(&ctx).unwrap();
    }

    #[test]
    fn test_recycle_restores_workers() {
        let pool = pool(3);
        pool.recycle().unwrap();

        let stats = pool.stats();
        assert!(stats.running);
        assert_eq!(stats.threads, 3);

        let ctx = TaskContext::root();
        let waiter = pool.waiter();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            pool.submit(
                &ctx,
                Some(&waiter),
                move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
                true,
            );
        }
        waiter.wait(&ctx).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_shutdown_releases_waiters_of_dropped_tasks() {
        let pool = pool(1);
        let ctx = TaskContext::root();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let busy = pool.waiter();
        pool.submit(
            &ctx,
            Some(&busy),
            move |_| {
                let _ = started_tx.send(());
                let _ = release_rx.recv_timeout(Duration::from_secs(10));
                Ok(())
            },
            false,
        );
        started_rx.recv_timeout(Duration::from_secs(10)).unwrap();

        let queued = pool.waiter();
        pool.submit(&ctx, Some(&queued), |_| Ok(()), false);
        assert_eq!(queued.pending(), 1);

        let stopper = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.shutdown())
        };
        // The queued entry is dropped before the busy worker is released.
        while queued.pending() > 0 {
            thread::sleep(Duration::from_millis(1));
        }
        release_tx.send(()).unwrap();
        stopper.join().unwrap();

        assert!(matches!(
            queued.wait(&ctx),
            Err(PoolError::TaskFailed { failures: 1 })
        ));
        busy.wait(&ctx).unwrap();
    }
}
