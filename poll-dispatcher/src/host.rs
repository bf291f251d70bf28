//! Host binding traits
//!
//! A host is whatever owns the per-frame tick: a game loop, a UI event
//! loop, an editor update callback. The binding layer for a concrete host
//! implements [`Host`] and forwards its native lifecycle signals as
//! [`HostEvent`]s to the registered [`TickListener`].

use std::sync::Arc;

use crate::error::HostError;

/// Lifecycle signals a host forwards to its tick listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEvent {
    /// The application lost the foreground
    Paused,
    /// The application regained the foreground
    Resumed,
    /// The host started running the application (e.g. an editor entered play mode)
    EnteredActiveMode,
    /// The host went back to its idle/edit mode; one-time setup must run again
    EnteredIdleMode,
    /// The object owning the listener was disabled while the application runs
    Disabled,
    /// The application wants to quit
    QuitRequested,
}

/// Something a host can tick once per frame
pub trait TickListener: Send + Sync {
    /// Called once per host tick, always from the host's own thread
    fn tick(&self);

    /// Called for lifecycle signals. For [`HostEvent::QuitRequested`] and
    /// [`HostEvent::Disabled`] the return value tells the host whether it may
    /// proceed; it is ignored for the other events.
    fn on_host_event(&self, event: HostEvent) -> bool {
        let _ = event;
        true
    }
}

/// The external tick source a dispatcher binds to
pub trait Host {
    /// Fails when the caller is not in a context the host accepts calls from
    fn check_context(&self) -> Result<(), HostError>;

    /// Start ticking `listener` once per frame
    fn register_tick_listener(&self, listener: Arc<dyn TickListener>) -> Result<(), HostError>;

    /// Stop ticking the registered listener, if any
    fn unregister_tick_listener(&self);
}

/// A host with no tick source
///
/// Every context is valid and registration is a no-op, so the caller is
/// expected to drive `tick()` itself or run threaded.
#[derive(Debug, Default, Clone, Copy)]
pub struct Detached;

impl Host for Detached {
    fn check_context(&self) -> Result<(), HostError> {
        Ok(())
    }

    fn register_tick_listener(&self, _listener: Arc<dyn TickListener>) -> Result<(), HostError> {
        tracing::debug!("No host tick source available, listener not registered");
        Ok(())
    }

    fn unregister_tick_listener(&self) {}
}
