//! Background poll thread
//!
//! Spawns a named thread that polls, pauses, and repeats until its stop
//! signal is raised. Stopping never joins: the thread sees the signal at
//! its next wake and exits on its own.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{catch_panic, DispatcherError, Result};

/// A one-way flag that threads can wait on
#[derive(Debug, Default)]
pub struct Latch {
    set: Mutex<bool>,
    cond: Condvar,
}

impl Latch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the latch and wake every waiter
    pub fn set(&self) {
        let mut set = self.set.lock();
        *set = true;
        self.cond.notify_all();
    }

    pub fn is_set(&self) -> bool {
        *self.set.lock()
    }

    /// Block until the latch is raised or `timeout` elapses
    ///
    /// Returns whether the latch is raised.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut set = self.set.lock();
        while !*set {
            if self.cond.wait_until(&mut set, deadline).timed_out() {
                break;
            }
        }
        *set
    }
}

/// Decides how the background loop waits between two polls
pub trait Pacer: Send + Sync + 'static {
    /// Wait roughly `interval`. May return early once `stop` is raised.
    fn pause(&self, interval: Duration, stop: &Latch);
}

/// Waits on the stop signal, so a stop request wakes the loop immediately
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalPacer;

impl Pacer for SignalPacer {
    fn pause(&self, interval: Duration, stop: &Latch) {
        stop.wait_timeout(interval);
    }
}

/// Handle to one background loop
///
/// Each loop gets its own stop signal, so stopping one loop and launching
/// another can never revive the first.
#[derive(Debug, Clone)]
pub struct LoopHandle {
    id: u64,
    stop: Arc<Latch>,
    finished: Arc<Latch>,
}

impl LoopHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Ask the loop to exit. Returns immediately.
    pub fn stop(&self) {
        self.stop.set();
    }

    pub fn is_stopping(&self) -> bool {
        self.stop.is_set()
    }

    /// Whether the loop thread has left its loop
    pub fn is_finished(&self) -> bool {
        self.finished.is_set()
    }

    /// Wait up to `timeout` for the loop thread to exit
    ///
    /// Returns whether it did. Does not itself request a stop.
    pub fn wait_stopped(&self, timeout: Duration) -> bool {
        self.finished.wait_timeout(timeout)
    }
}

/// Spawn the background poll loop
///
/// `poll` is expected to contain its own failures. Anything else that
/// panics inside the loop (the pacer, bookkeeping) ends the loop and is
/// logged; the loop does not restart itself.
pub(crate) fn spawn_poll_loop<F>(
    id: u64,
    interval: Duration,
    pacer: Arc<dyn Pacer>,
    poll: F,
) -> Result<LoopHandle>
where
    F: Fn() + Send + 'static,
{
    let handle = LoopHandle {
        id,
        stop: Arc::new(Latch::new()),
        finished: Arc::new(Latch::new()),
    };

    let stop = Arc::clone(&handle.stop);
    let finished = Arc::clone(&handle.finished);

    thread::Builder::new()
        .name(format!("poll-dispatcher-{}", id))
        .spawn(move || {
            tracing::info!("Poll loop {} started (interval: {:?})", id, interval);

            let outcome = catch_panic(|| {
                while !stop.is_set() {
                    poll();

                    if stop.is_set() {
                        break;
                    }
                    pacer.pause(interval, &stop);
                }
            });

            if let Err(message) = outcome {
                tracing::error!("{}", DispatcherError::BackgroundLoop(message));
            }

            finished.set();
            tracing::info!("Poll loop {} ended", id);
        })?;

    Ok(handle)
}
