use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use super::{TaskContext, WorkPool};

impl WorkPool {
    /// Apply `f` to every input as a leaf task and collect results by position.
    ///
    /// Slot `i` holds the result for `inputs[i]` regardless of completion
    /// order. A slot is `None` only when its task panicked or was dropped by
    /// a concurrent shutdown.
    pub fn map_indexed<I, T, F>(&self, ctx: &TaskContext, inputs: Vec<I>, f: F) -> Vec<Option<T>>
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> T + Send + Sync + 'static,
    {
        let len = inputs.len();
        let slots: Arc<Mutex<Vec<Option<T>>>> =
            Arc::new(Mutex::new((0..len).map(|_| None).collect()));
        let f = Arc::new(f);

        let waiter = self.waiter();
        for (index, input) in inputs.into_iter().enumerate() {
            let slots = Arc::clone(&slots);
            let f = Arc::clone(&f);
            self.submit(
                ctx,
                Some(&waiter),
                move |_| {
                    let output = f(input);
                    slots.lock()[index] = Some(output);
                    Ok(())
                },
                true,
            );
        }
        if let Err(e) = waiter.wait(ctx) {
            warn!(inputs = len, error = %e, "Indexed map finished with failed slots");
        }
        drop(waiter);

        match Arc::try_unwrap(slots) {
            Ok(slots) => slots.into_inner(),
            Err(shared) => std::mem::take(&mut *shared.lock()),
        }
    }
}
