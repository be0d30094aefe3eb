use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag gating an accept loop.
///
/// Clones observe the same flag. This is the only value that may be
/// touched from a thread other than the one running the loop.
///
/// Clearing the flag does not interrupt an accept that is already
/// blocked; the loop notices the request once that accept returns.
#[derive(Debug, Clone, Default)]
pub struct RunFlag {
    running: Arc<AtomicBool>,
}

impl RunFlag {
    /// Creates a cleared flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the loop as allowed to run.
    pub fn set(&self) {
        self.running.store(true, Ordering::Release);
    }

    /// Requests loop termination.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Returns `true` while the loop may keep accepting.
    pub fn is_set(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}
