//! # Poll Dispatcher
//!
//! Routes a host's per-frame tick, or a dedicated background thread, into a
//! single polling routine, and coordinates an orderly shutdown.
//!
//! ## Overview
//!
//! Something has to call a client library's update routine regularly:
//! finish requests, run callbacks, expire caches. In an application with a
//! frame loop that is naturally the frame tick; elsewhere, or when the
//! frame rate is too uneven, a background thread does it instead. The
//! [`PollDispatcher`] owns that decision and can switch between the two at
//! runtime.
//!
//! ## Key Features
//!
//! - **Skip-if-busy**: the update hook never runs concurrently with itself.
//!   A call that finds one in flight does nothing, it never waits or queues.
//! - **Two modes**: cooperative (host tick) or threaded (background loop),
//!   swappable at runtime.
//! - **Vetoable shutdown**: a before-quit predicate can postpone shutdown.
//! - **Best effort**: failures are logged through `tracing`, never raised
//!   to the host.
//!
//! ## Usage
//!
//! ```rust
//! use poll_dispatcher::{manager, DispatcherConfig, PollDispatcher, ThreadingMode};
//! use std::sync::Arc;
//!
//! let dispatcher = PollDispatcher::builder(Arc::new(manager::from_fn(|| Ok(()))))
//!     .with_config(DispatcherConfig::cooperative())
//!     .with_before_quit(|| true)
//!     .build()?;
//!
//! // Driven by the host tick
//! dispatcher.tick();
//!
//! // Move polling onto a background thread, and back
//! assert_eq!(dispatcher.swap_threading_mode(), ThreadingMode::Threaded);
//! assert_eq!(dispatcher.swap_threading_mode(), ThreadingMode::Cooperative);
//!
//! assert!(dispatcher.request_shutdown());
//! # Ok::<(), poll_dispatcher::DispatcherError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! host tick ──► tick() ──┐
//!                        ├─► guarded_poll() ──► Manager::on_update()
//! poll loop thread ──────┘    (CAS in-flight flag)
//! ```
//!
//! Only one of the two sources is active at a time, selected by
//! [`ThreadingMode`]. The background loop is never joined on stop; it sees
//! its stop signal at its next wake. [`LoopHandle::wait_stopped`] is there
//! for callers that need to know it has exited.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod guard;
pub mod hooks;
pub mod host;
pub mod instance;
pub mod logging;
pub mod manager;
pub mod worker;

// Re-export main types for convenience
pub use config::DispatcherConfig;
pub use dispatcher::{DispatcherStats, PollDispatcher, PollDispatcherBuilder, ThreadingMode};
pub use error::{DispatcherError, HostError, ManagerError, Result};
pub use guard::PollOutcome;
pub use host::{Detached, Host, HostEvent, TickListener};
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};
pub use manager::Manager;
pub use worker::{Latch, LoopHandle, Pacer, SignalPacer};

/// Prelude module for convenient imports
///
/// ```rust
/// use poll_dispatcher::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        DispatcherConfig, DispatcherError, Host, HostEvent, Manager, ManagerError, PollDispatcher,
        PollOutcome, ThreadingMode, TickListener,
    };
}
