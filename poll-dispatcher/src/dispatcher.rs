//! The poll dispatcher
//!
//! Decides when, and on which thread, the manager's update hook runs.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::DispatcherConfig;
use crate::error::{catch_panic, DispatcherError, Result};
use crate::guard::{InFlight, PollOutcome};
use crate::hooks::Hooks;
use crate::host::{HostEvent, TickListener};
use crate::instance;
use crate::manager::Manager;
use crate::worker::{spawn_poll_loop, LoopHandle, Pacer, SignalPacer};

/// Which execution context drives polling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadingMode {
    /// Polled from the host tick
    Cooperative,
    /// Polled from a dedicated background thread
    Threaded,
}

impl fmt::Display for ThreadingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadingMode::Cooperative => write!(f, "cooperative"),
            ThreadingMode::Threaded => write!(f, "threaded"),
        }
    }
}

/// Snapshot of the dispatcher counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    /// Callback invocations that returned normally
    pub polls: u64,
    /// Callback invocations that failed
    pub failures: u64,
    /// Calls skipped because another invocation was in flight
    pub skipped_busy: u64,
    /// Background loops launched
    pub loops_started: u64,
}

impl DispatcherStats {
    /// Every time the callback actually ran
    pub fn invocations(&self) -> u64 {
        self.polls + self.failures
    }
}

#[derive(Default)]
struct Counters {
    polls: AtomicU64,
    failures: AtomicU64,
    skipped_busy: AtomicU64,
    loops_started: AtomicU64,
}

struct ModeState {
    mode: ThreadingMode,
    current_loop: Option<LoopHandle>,
}

struct Shared {
    manager: Arc<dyn Manager>,
    config: DispatcherConfig,
    pacer: Arc<dyn Pacer>,
    setup_called: AtomicBool,
    running: AtomicBool,
    in_flight: InFlight,
    state: Mutex<ModeState>,
    hooks: Hooks,
    counters: Counters,
    next_loop_id: AtomicU64,
}

impl Shared {
    fn guarded_poll(&self) -> PollOutcome {
        if !self.running.load(Ordering::Acquire) {
            return PollOutcome::NotRunning;
        }

        let Some(_guard) = self.in_flight.try_acquire() else {
            self.counters.skipped_busy.fetch_add(1, Ordering::Relaxed);
            return PollOutcome::Busy;
        };

        let failure = match catch_panic(|| self.manager.on_update()) {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(message) => Some(format!("panicked: {}", message)),
        };

        match failure {
            None => {
                self.counters.polls.fetch_add(1, Ordering::Relaxed);
                PollOutcome::Polled
            }
            Some(message) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("{}", DispatcherError::PollFailure(message));
                PollOutcome::Failed
            }
        }
    }
}

/// Routes host ticks or a background thread into the manager's update hook
///
/// A cheap handle: clones share the same state. At most one invocation of
/// [`Manager::on_update`] runs at any instant; a call that finds one in
/// flight does nothing.
///
/// # Example
///
/// ```rust
/// use poll_dispatcher::{manager, DispatcherConfig, PollDispatcher, ThreadingMode};
/// use std::sync::Arc;
///
/// let dispatcher = PollDispatcher::builder(Arc::new(manager::from_fn(|| Ok(()))))
///     .with_config(DispatcherConfig::cooperative())
///     .build()
///     .expect("valid config");
///
/// // First tick runs setup, then polls
/// dispatcher.tick();
/// assert_eq!(dispatcher.mode(), ThreadingMode::Cooperative);
/// assert_eq!(dispatcher.stats().polls, 1);
///
/// assert!(dispatcher.request_shutdown());
/// ```
#[derive(Clone)]
pub struct PollDispatcher {
    shared: Arc<Shared>,
}

impl PollDispatcher {
    /// Create a dispatcher with the default configuration
    pub fn new(manager: Arc<dyn Manager>) -> Self {
        Self::from_parts(manager, DispatcherConfig::default(), Arc::new(SignalPacer), Hooks::default())
    }

    pub fn builder(manager: Arc<dyn Manager>) -> PollDispatcherBuilder {
        PollDispatcherBuilder::new(manager)
    }

    fn from_parts(
        manager: Arc<dyn Manager>,
        config: DispatcherConfig,
        pacer: Arc<dyn Pacer>,
        hooks: Hooks,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                manager,
                config,
                pacer,
                setup_called: AtomicBool::new(false),
                running: AtomicBool::new(false),
                in_flight: InFlight::new(),
                state: Mutex::new(ModeState {
                    mode: ThreadingMode::Cooperative,
                    current_loop: None,
                }),
                hooks,
                counters: Counters::default(),
                next_loop_id: AtomicU64::new(0),
            }),
        }
    }

    /// One-time setup
    ///
    /// Runs the manager's setup, starts accepting polls, and picks the
    /// initial mode: threaded when configured and supported, cooperative
    /// otherwise. Later calls are no-ops until [`reset_setup`](Self::reset_setup).
    pub fn setup(&self) {
        if self.shared.setup_called.swap(true, Ordering::AcqRel) {
            tracing::debug!("Setup already called, skipping");
            return;
        }

        let result = match catch_panic(|| self.shared.manager.setup()) {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(message) => Err(format!("panicked: {}", message)),
        };
        if let Err(message) = result {
            tracing::error!("{}", DispatcherError::SetupContext(message));
            return;
        }

        self.shared.running.store(true, Ordering::Release);

        let config = &self.shared.config;
        if config.threaded && !config.threads_supported {
            tracing::warn!("Background threads are not supported here, polling cooperatively");
        }

        let mode = {
            let mut state = self.shared.state.lock();
            if config.effective_threaded() {
                match self.launch_loop(&mut state) {
                    Ok(()) => state.mode = ThreadingMode::Threaded,
                    Err(e) => {
                        tracing::error!("{}, falling back to cooperative polling", e);
                        state.mode = ThreadingMode::Cooperative;
                    }
                }
            } else {
                if let Some(old) = state.current_loop.take() {
                    old.stop();
                }
                state.mode = ThreadingMode::Cooperative;
            }
            state.mode
        };

        tracing::info!("Setup done, polling is {}", mode);
    }

    /// Forget that setup ran, so the next tick or `setup()` runs it again
    ///
    /// Also resets the manager's one-time initialization. Used when the host
    /// returns to its idle mode.
    pub fn reset_setup(&self) {
        self.shared.setup_called.store(false, Ordering::Release);

        if let Err(message) = catch_panic(|| self.shared.manager.reset_setup()) {
            tracing::error!("Manager reset panicked: {}", message);
        }

        tracing::info!("Setup reset");
    }

    /// Toggle between cooperative and threaded polling
    ///
    /// Threaded → cooperative raises the loop's stop signal and returns
    /// without waiting; the thread exits at its next wake. Cooperative →
    /// threaded launches a fresh loop, but only while the dispatcher is
    /// running. Returns the resulting mode.
    pub fn swap_threading_mode(&self) -> ThreadingMode {
        let mut state = self.shared.state.lock();

        match state.mode {
            ThreadingMode::Threaded => {
                if let Some(current) = state.current_loop.take() {
                    current.stop();
                }
                state.mode = ThreadingMode::Cooperative;
                tracing::info!("Switched to cooperative polling");
            }
            ThreadingMode::Cooperative => {
                if !self.is_running() {
                    tracing::warn!("Dispatcher is not running, staying cooperative");
                    return state.mode;
                }
                if !self.shared.config.threads_supported {
                    tracing::warn!("Background threads are not supported here, staying cooperative");
                    return state.mode;
                }

                match self.launch_loop(&mut state) {
                    Ok(()) => {
                        state.mode = ThreadingMode::Threaded;
                        tracing::info!("Switched to threaded polling");
                    }
                    Err(e) => tracing::error!("{}, staying cooperative", e),
                }
            }
        }

        state.mode
    }

    fn launch_loop(&self, state: &mut ModeState) -> Result<()> {
        if let Some(old) = state.current_loop.take() {
            old.stop();
        }

        let id = self.shared.next_loop_id.fetch_add(1, Ordering::Relaxed) + 1;
        let shared = Arc::clone(&self.shared);
        let handle = spawn_poll_loop(
            id,
            self.shared.config.poll_interval,
            Arc::clone(&self.shared.pacer),
            move || {
                shared.guarded_poll();
            },
        )?;

        self.shared.counters.loops_started.fetch_add(1, Ordering::Relaxed);
        state.current_loop = Some(handle);
        Ok(())
    }

    /// Host tick: lazy setup on the first call, then poll unless threaded
    pub fn tick(&self) {
        if !self.shared.setup_called.load(Ordering::Acquire) {
            self.setup();
        }

        if self.mode() != ThreadingMode::Threaded {
            self.guarded_poll();
        }
    }

    /// Invoke the manager's update hook unless an invocation is already in flight
    ///
    /// Never blocks and never queues. The in-flight flag is cleared whether
    /// the hook returns, fails, or panics.
    pub fn guarded_poll(&self) -> PollOutcome {
        self.shared.guarded_poll()
    }

    /// Shut the dispatcher down, unless the before-quit predicate vetoes it
    ///
    /// Returns whether the host may proceed with quitting. On success the
    /// background loop is told to stop, polling ends, the manager's quit
    /// hook runs once, and the dispatcher leaves the process-wide instance
    /// slot if it was there.
    pub fn request_shutdown(&self) -> bool {
        tracing::info!("Shutdown requested");

        if let Err(err) = self.shared.hooks.check_before_quit() {
            tracing::info!("{}, postponing shutdown", err);
            return false;
        }

        // Cleared before taking the loop, so a concurrent swap cannot launch
        // one after it is gone.
        let was_running = self.shared.running.swap(false, Ordering::AcqRel);
        if let Some(current) = self.shared.state.lock().current_loop.take() {
            current.stop();
        }
        instance::release(self);

        if !was_running {
            tracing::debug!("Dispatcher was not running, nothing to shut down");
            return true;
        }

        if let Err(message) = catch_panic(|| self.shared.manager.on_quit()) {
            tracing::error!("Manager quit hook panicked: {}", message);
        }

        tracing::info!("Dispatcher shut down");
        true
    }

    /// Forward a pause/resume signal to the foreground observer, if any
    pub fn notify_foreground_state_changed(&self, is_paused: bool) {
        tracing::info!("Foreground state changed, paused: {}", is_paused);
        self.shared.hooks.notify_foreground(is_paused);
    }

    /// Apply a host lifecycle signal
    ///
    /// Returns false only when a quit or disable was vetoed.
    pub fn handle_host_event(&self, event: HostEvent) -> bool {
        tracing::debug!("Host event: {:?}", event);

        match event {
            HostEvent::Paused => {
                self.notify_foreground_state_changed(true);
                true
            }
            HostEvent::Resumed => {
                self.notify_foreground_state_changed(false);
                true
            }
            HostEvent::EnteredActiveMode => true,
            HostEvent::EnteredIdleMode => {
                self.reset_setup();
                true
            }
            HostEvent::Disabled | HostEvent::QuitRequested => self.request_shutdown(),
        }
    }

    pub fn set_before_quit<F>(&self, hook: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.shared.hooks.set_before_quit(Some(Arc::new(hook)));
    }

    pub fn clear_before_quit(&self) {
        self.shared.hooks.set_before_quit(None);
    }

    pub fn set_foreground_observer<F>(&self, observer: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.shared.hooks.set_foreground(Some(Arc::new(observer)));
    }

    pub fn clear_foreground_observer(&self) {
        self.shared.hooks.set_foreground(None);
    }

    pub fn mode(&self) -> ThreadingMode {
        self.shared.state.lock().mode
    }

    pub fn is_threaded(&self) -> bool {
        self.mode() == ThreadingMode::Threaded
    }

    /// Whether a background loop is currently alive and not asked to stop
    pub fn is_thread_running(&self) -> bool {
        self.shared
            .state
            .lock()
            .current_loop
            .as_ref()
            .map_or(false, |h| !h.is_stopping() && !h.is_finished())
    }

    /// Handle to the current background loop, if one was launched and not stopped
    pub fn loop_handle(&self) -> Option<LoopHandle> {
        self.shared.state.lock().current_loop.clone()
    }

    pub fn is_setup(&self) -> bool {
        self.shared.setup_called.load(Ordering::Acquire)
    }

    /// Whether polls are accepted: set up and not shut down
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Whether a callback invocation is in flight right now
    pub fn is_polling(&self) -> bool {
        self.shared.in_flight.is_set()
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.shared.config
    }

    pub fn stats(&self) -> DispatcherStats {
        let c = &self.shared.counters;
        DispatcherStats {
            polls: c.polls.load(Ordering::Relaxed),
            failures: c.failures.load(Ordering::Relaxed),
            skipped_busy: c.skipped_busy.load(Ordering::Relaxed),
            loops_started: c.loops_started.load(Ordering::Relaxed),
        }
    }

    /// Whether both handles refer to the same dispatcher
    pub fn ptr_eq(&self, other: &PollDispatcher) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl fmt::Debug for PollDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollDispatcher")
            .field("mode", &self.mode())
            .field("running", &self.is_running())
            .field("setup", &self.is_setup())
            .field("config", &self.shared.config)
            .finish()
    }
}

impl TickListener for PollDispatcher {
    fn tick(&self) {
        PollDispatcher::tick(self);
    }

    fn on_host_event(&self, event: HostEvent) -> bool {
        self.handle_host_event(event)
    }
}

/// Builder for [`PollDispatcher`]
pub struct PollDispatcherBuilder {
    manager: Arc<dyn Manager>,
    config: DispatcherConfig,
    pacer: Arc<dyn Pacer>,
    hooks: Hooks,
}

impl PollDispatcherBuilder {
    pub fn new(manager: Arc<dyn Manager>) -> Self {
        Self {
            manager,
            config: DispatcherConfig::default(),
            pacer: Arc::new(SignalPacer),
            hooks: Hooks::default(),
        }
    }

    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace how the background loop waits between polls
    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_before_quit<F>(self, hook: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.hooks.set_before_quit(Some(Arc::new(hook)));
        self
    }

    pub fn with_foreground_observer<F>(self, observer: F) -> Self
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.hooks.set_foreground(Some(Arc::new(observer)));
        self
    }

    /// Validate the configuration and build the dispatcher
    pub fn build(self) -> Result<PollDispatcher> {
        self.config.validate()?;
        Ok(PollDispatcher::from_parts(
            self.manager,
            self.config,
            self.pacer,
            self.hooks,
        ))
    }
}
