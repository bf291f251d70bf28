//! # Frame Host
//!
//! A minimal cooperative host for `poll_dispatcher`: a frame loop that runs
//! on the thread that created it, ticks one registered listener per frame,
//! and forwards pause, mode and quit signals as [`HostEvent`]s.
//!
//! ## Usage
//!
//! ```rust
//! use frame_host::FrameLoop;
//! use poll_dispatcher::{instance, manager, PollDispatcher};
//! use std::sync::Arc;
//!
//! let frames = FrameLoop::new();
//! let dispatcher = instance::ensure_instance(&frames, || {
//!     PollDispatcher::new(Arc::new(manager::from_fn(|| Ok(()))))
//! })
//! .expect("called from the frame loop's thread");
//!
//! frames.run_frames(3)?;
//! assert_eq!(dispatcher.stats().polls, 3);
//!
//! assert!(frames.request_quit());
//! assert!(instance::shutdown_instance(&frames));
//! # Ok::<(), frame_host::FrameError>(())
//! ```

pub mod error;
pub mod frame_loop;

pub use error::{FrameError, Result};
pub use frame_loop::FrameLoop;
pub use poll_dispatcher::HostEvent;
