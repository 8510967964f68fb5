/// Nesting state of the code currently calling into the pool.
///
/// Code outside the pool starts from [`TaskContext::root`]. Every task body
/// receives the context it runs under, one level deeper than its caller, and
/// must hand that context back to [`WorkPool::submit`](super::WorkPool::submit)
/// and [`Waiter::wait`](super::Waiter::wait).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskContext {
    depth: usize,
    leaf: bool,
}

impl TaskContext {
    pub const ROOT: TaskContext = TaskContext {
        depth: 0,
        leaf: false,
    };

    /// Context of a thread that is not running pool work.
    pub const fn root() -> Self {
        Self::ROOT
    }

    /// How many pool tasks are stacked on this thread.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether the current task was submitted as a leaf.
    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    pub fn is_nested(&self) -> bool {
        self.depth > 0
    }

    pub(crate) fn enter(&self, leaf: bool) -> Self {
        Self {
            depth: self.depth + 1,
            leaf,
        }
    }
}
