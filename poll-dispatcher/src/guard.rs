//! Skip-if-busy guard around the poll callback

use std::sync::atomic::{AtomicBool, Ordering};

/// What a single `guarded_poll()` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The callback ran and returned normally
    Polled,
    /// The callback ran and returned an error or panicked
    Failed,
    /// Another invocation was in flight; nothing happened
    Busy,
    /// The dispatcher is not set up or has shut down; nothing happened
    NotRunning,
}

impl PollOutcome {
    /// Whether the callback was actually invoked
    pub fn invoked(self) -> bool {
        matches!(self, PollOutcome::Polled | PollOutcome::Failed)
    }
}

/// In-flight flag taken with compare-and-swap
#[derive(Debug, Default)]
pub(crate) struct InFlight(AtomicBool);

impl InFlight {
    pub(crate) fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Take the flag if it was clear. Never blocks.
    pub(crate) fn try_acquire(&self) -> Option<InFlightGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard { flag: &self.0 })
    }

    pub(crate) fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Clears the in-flight flag when dropped, including during unwinding
pub(crate) struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
