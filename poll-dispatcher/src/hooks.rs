//! Observer callbacks registered by the host application

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{catch_panic, DispatcherError};

/// Predicate consulted before shutdown; `false` vetoes it
pub type BeforeQuit = Arc<dyn Fn() -> bool + Send + Sync>;

/// Observer told about foreground changes; the argument is `is_paused`
pub type ForegroundObserver = Arc<dyn Fn(bool) + Send + Sync>;

#[derive(Default)]
pub(crate) struct Hooks {
    before_quit: RwLock<Option<BeforeQuit>>,
    foreground: RwLock<Option<ForegroundObserver>>,
}

impl Hooks {
    pub(crate) fn set_before_quit(&self, hook: Option<BeforeQuit>) {
        *self.before_quit.write() = hook;
    }

    pub(crate) fn set_foreground(&self, observer: Option<ForegroundObserver>) {
        *self.foreground.write() = observer;
    }

    /// Ask the before-quit predicate whether shutdown may go ahead
    ///
    /// No predicate means yes. A panicking predicate counts as a veto.
    pub(crate) fn check_before_quit(&self) -> Result<(), DispatcherError> {
        // Clone out so the predicate can re-register hooks without deadlocking.
        let Some(hook) = self.before_quit.read().clone() else {
            return Ok(());
        };

        match catch_panic(|| hook()) {
            Ok(true) => Ok(()),
            Ok(false) => Err(DispatcherError::ShutdownAborted(
                "before-quit callback returned false".to_string(),
            )),
            Err(message) => Err(DispatcherError::ShutdownAborted(format!(
                "before-quit callback panicked: {}",
                message
            ))),
        }
    }

    pub(crate) fn notify_foreground(&self, is_paused: bool) {
        let Some(observer) = self.foreground.read().clone() else {
            return;
        };

        if let Err(message) = catch_panic(|| observer(is_paused)) {
            tracing::error!("Foreground observer panicked: {}", message);
        }
    }
}
