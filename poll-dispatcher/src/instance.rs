//! Process-wide dispatcher instance
//!
//! The single access point for code that wants "the" dispatcher rather
//! than passing one around. Creation and teardown are serialized by one
//! mutex, so two near-simultaneous `ensure_instance` calls create exactly
//! one dispatcher. Everything here is safe to call from any thread the
//! host accepts.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::dispatcher::PollDispatcher;
use crate::error::DispatcherError;
use crate::host::Host;

static INSTANCE: Mutex<Option<PollDispatcher>> = parking_lot::const_mutex(None);

/// Get the live instance, creating and registering one if there is none
///
/// On creation `factory` builds the dispatcher and it is registered as the
/// host's tick listener. Returns `None`, after logging, when the host
/// rejects the calling context or the registration; nothing is stored in
/// that case. `factory` runs under the instance lock and must not call back
/// into this module.
pub fn ensure_instance<F>(host: &dyn Host, factory: F) -> Option<PollDispatcher>
where
    F: FnOnce() -> PollDispatcher,
{
    if let Err(err) = host.check_context() {
        tracing::error!(
            "{}; create the dispatcher from the host's main context before polling",
            DispatcherError::from(err)
        );
        return None;
    }

    let mut slot = INSTANCE.lock();
    if let Some(existing) = slot.as_ref() {
        return Some(existing.clone());
    }

    let dispatcher = factory();
    if let Err(err) = host.register_tick_listener(Arc::new(dispatcher.clone())) {
        tracing::error!("{}", DispatcherError::from(err));
        return None;
    }

    *slot = Some(dispatcher.clone());
    tracing::info!("Dispatcher instance created");
    Some(dispatcher)
}

/// The live instance, if any
pub fn current() -> Option<PollDispatcher> {
    INSTANCE.lock().clone()
}

pub fn is_created() -> bool {
    INSTANCE.lock().is_some()
}

/// Run the shutdown sequence on the live instance
///
/// Returns whether the host may quit. When the dispatcher agrees, the slot
/// is cleared and the host stops ticking it, so a later `ensure_instance`
/// creates a fresh one. With no live instance this returns true.
pub fn shutdown_instance(host: &dyn Host) -> bool {
    // Not holding the lock while user callbacks run.
    let Some(dispatcher) = current() else {
        return true;
    };

    // A successful shutdown releases the slot itself.
    if !dispatcher.request_shutdown() {
        return false;
    }

    host.unregister_tick_listener();
    true
}

/// Clear the slot if it holds `dispatcher`
///
/// Called once a dispatcher has shut down, whichever path the shutdown came
/// through, so the slot never hands out a dead instance.
pub(crate) fn release(dispatcher: &PollDispatcher) {
    let mut slot = INSTANCE.lock();
    if slot.as_ref().is_some_and(|d| d.ptr_eq(dispatcher)) {
        *slot = None;
        tracing::info!("Dispatcher instance destroyed");
    }
}
