//! A cooperative frame loop owning one tick listener

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;

use parking_lot::Mutex;
use poll_dispatcher::{Host, HostError, HostEvent, TickListener};

use crate::error::{FrameError, Result};

/// A single-threaded frame loop
///
/// The thread that creates the loop owns it: frames can only be run from
/// there, and [`Host::check_context`] rejects every other thread, the way
/// engine APIs reject calls from worker threads.
pub struct FrameLoop {
    owner: ThreadId,
    frame_interval: Duration,
    listener: Mutex<Option<Arc<dyn TickListener>>>,
    frames: AtomicU64,
    paused: AtomicBool,
    active: AtomicBool,
    closed: AtomicBool,
}

impl FrameLoop {
    /// Create a loop owned by the calling thread, at roughly 60 frames per second
    pub fn new() -> Self {
        Self::with_frame_interval(Duration::from_millis(16))
    }

    pub fn with_frame_interval(frame_interval: Duration) -> Self {
        Self {
            owner: thread::current().id(),
            frame_interval,
            listener: Mutex::new(None),
            frames: AtomicU64::new(0),
            paused: AtomicBool::new(false),
            active: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_runnable(&self) -> std::result::Result<(), HostError> {
        self.check_context()?;
        if self.closed.load(Ordering::Acquire) {
            return Err(HostError::Closed);
        }
        Ok(())
    }

    /// Run one frame and return its number
    ///
    /// A paused loop does not tick its listener, but the frame still counts.
    pub fn run_frame(&self) -> Result<u64> {
        self.ensure_runnable()?;
        let frame = self.frames.fetch_add(1, Ordering::AcqRel) + 1;

        if self.paused.load(Ordering::Acquire) {
            return Ok(frame);
        }

        // Tick outside the lock; the listener may unregister itself.
        let listener = self.listener.lock().clone();
        if let Some(listener) = listener {
            listener.tick();
        }

        Ok(frame)
    }

    /// Run `count` frames, sleeping one frame interval between them
    pub fn run_frames(&self, count: u64) -> Result<()> {
        for i in 0..count {
            self.run_frame()?;
            if i + 1 < count {
                thread::sleep(self.frame_interval);
            }
        }
        Ok(())
    }

    /// Run frames until `done` returns true for a frame number
    ///
    /// Fails with [`FrameError::FrameLimit`] after `max_frames` frames.
    pub fn run_until<F>(&self, max_frames: u64, mut done: F) -> Result<u64>
    where
        F: FnMut(u64) -> bool,
    {
        for _ in 0..max_frames {
            let frame = self.run_frame()?;
            if done(frame) {
                return Ok(frame);
            }
            thread::sleep(self.frame_interval);
        }
        Err(FrameError::FrameLimit(max_frames))
    }

    fn forward(&self, event: HostEvent) -> bool {
        let listener = self.listener.lock().clone();
        match listener {
            Some(listener) => listener.on_host_event(event),
            None => true,
        }
    }

    /// The application lost the foreground
    pub fn pause(&self) {
        if !self.paused.swap(true, Ordering::AcqRel) {
            tracing::debug!("Frame loop paused");
            self.forward(HostEvent::Paused);
        }
    }

    /// The application regained the foreground
    pub fn resume(&self) {
        if self.paused.swap(false, Ordering::AcqRel) {
            tracing::debug!("Frame loop resumed");
            self.forward(HostEvent::Resumed);
        }
    }

    /// Start running the application
    pub fn enter_active_mode(&self) {
        self.active.store(true, Ordering::Release);
        self.forward(HostEvent::EnteredActiveMode);
    }

    /// Return to idle mode; the listener is asked to redo its setup
    pub fn enter_idle_mode(&self) {
        self.active.store(false, Ordering::Release);
        self.forward(HostEvent::EnteredIdleMode);
    }

    /// Disable the listener's owner while the application runs
    ///
    /// Only forwarded in active mode. When the listener agrees to shut down
    /// it is dropped and no longer ticked. Returns whether it agreed.
    pub fn disable(&self) -> bool {
        if !self.is_active() {
            return true;
        }
        if !self.forward(HostEvent::Disabled) {
            return false;
        }
        self.unregister_tick_listener();
        true
    }

    /// Ask to quit the application
    ///
    /// When the listener agrees, the loop closes and drops its listener.
    /// Returns whether quitting may proceed.
    pub fn request_quit(&self) -> bool {
        tracing::info!("Quit requested after {} frames", self.frame_count());

        if !self.forward(HostEvent::QuitRequested) {
            tracing::info!("Listener postponed quit");
            return false;
        }

        self.closed.store(true, Ordering::Release);
        self.unregister_tick_listener();
        true
    }

    pub fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn has_listener(&self) -> bool {
        self.listener.lock().is_some()
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for FrameLoop {
    fn check_context(&self) -> std::result::Result<(), HostError> {
        let current = thread::current();
        if current.id() != self.owner {
            return Err(HostError::WrongThread(
                current.name().unwrap_or("unnamed").to_string(),
            ));
        }
        Ok(())
    }

    fn register_tick_listener(
        &self,
        listener: Arc<dyn TickListener>,
    ) -> std::result::Result<(), HostError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(HostError::Closed);
        }

        let mut slot = self.listener.lock();
        if slot.is_some() {
            return Err(HostError::ListenerAlreadyRegistered);
        }
        *slot = Some(listener);
        tracing::debug!("Tick listener registered");
        Ok(())
    }

    fn unregister_tick_listener(&self) {
        if self.listener.lock().take().is_some() {
            tracing::debug!("Tick listener unregistered");
        }
    }
}
