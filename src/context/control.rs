//! Cooperative cancellation and wall-clock deadlines.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Stop conditions checked once per algorithm iteration.
///
/// Cloning shares the cancellation flag and deadline, which is how a
/// hybrid chain propagates its control to every stage.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    cancel: Option<Arc<AtomicBool>>,
    time_limit: Option<Duration>,
    deadline: Option<Instant>,
}

impl RunControl {
    /// Attaches a cancellation flag. Setting it to `true` stops the run at
    /// the next iteration boundary.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Sets a wall-clock budget, measured from [`arm`](Self::arm).
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Converts the time limit into an absolute deadline. A deadline that
    /// is already armed is kept.
    pub(crate) fn arm(&mut self) {
        if self.deadline.is_none() {
            self.deadline = self.time_limit.map(|limit| Instant::now() + limit);
        }
    }

    /// Whether the run should stop now.
    pub fn should_stop(&self) -> bool {
        if let Some(flag) = &self.cancel {
            if flag.load(Ordering::Relaxed) {
                return true;
            }
        }
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}
