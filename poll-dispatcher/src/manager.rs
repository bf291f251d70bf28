//! The polled subsystem
//!
//! The dispatcher knows nothing about what it polls. Whatever owns the real
//! work (request pipelines, connection pools, caches) implements [`Manager`]
//! and takes care of its own internal synchronization.

use crate::error::ManagerError;

/// Outbound hooks the dispatcher calls on the polled subsystem
pub trait Manager: Send + Sync + 'static {
    /// One-time initialization, called from the first `setup()`
    fn setup(&self) -> Result<(), ManagerError>;

    /// Periodic update. Never called concurrently with itself.
    fn on_update(&self) -> Result<(), ManagerError>;

    /// Final shutdown hook, called once per successful shutdown
    fn on_quit(&self);

    /// Forget one-time initialization so the next setup runs again
    fn reset_setup(&self) {}
}

/// A [`Manager`] built from a single polling function
///
/// Setup, quit and reset are no-ops.
pub struct FnManager<F> {
    poll: F,
}

impl<F> Manager for FnManager<F>
where
    F: Fn() -> Result<(), ManagerError> + Send + Sync + 'static,
{
    fn setup(&self) -> Result<(), ManagerError> {
        Ok(())
    }

    fn on_update(&self) -> Result<(), ManagerError> {
        (self.poll)()
    }

    fn on_quit(&self) {}
}

/// Wrap a polling function as a [`Manager`]
///
/// ```rust
/// use poll_dispatcher::{manager, PollDispatcher};
/// use std::sync::Arc;
///
/// let dispatcher = PollDispatcher::new(Arc::new(manager::from_fn(|| Ok(()))));
/// dispatcher.tick();
/// assert_eq!(dispatcher.stats().polls, 1);
/// ```
pub fn from_fn<F>(poll: F) -> FnManager<F>
where
    F: Fn() -> Result<(), ManagerError> + Send + Sync + 'static,
{
    FnManager { poll }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_from_fn_forwards_updates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let manager = from_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert!(manager.setup().is_ok());
        assert!(manager.on_update().is_ok());
        assert!(manager.on_update().is_ok());
        manager.on_quit();
        manager.reset_setup();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_from_fn_propagates_errors() {
        let manager = from_fn(|| Err("pipeline stalled".into()));
        let err = manager.on_update().unwrap_err();
        assert_eq!(err.to_string(), "pipeline stalled");
    }
}
