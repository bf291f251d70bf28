//! A PollDispatcher bound to a FrameLoop
//!
//! Each test binds its own dispatcher directly, without the process-wide
//! instance slot.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use frame_host::FrameLoop;
use poll_dispatcher::{
    DispatcherConfig, Host, Manager, ManagerError, PollDispatcher, ThreadingMode,
};
use rstest::rstest;

#[derive(Default)]
struct CountingManager {
    setups: AtomicUsize,
    updates: AtomicUsize,
    quits: AtomicUsize,
    resets: AtomicUsize,
}

impl Manager for CountingManager {
    fn setup(&self) -> Result<(), ManagerError> {
        self.setups.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn on_update(&self) -> Result<(), ManagerError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn on_quit(&self) {
        self.quits.fetch_add(1, Ordering::SeqCst);
    }

    fn reset_setup(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

fn bind(config: DispatcherConfig) -> (FrameLoop, PollDispatcher, Arc<CountingManager>) {
    let frames = FrameLoop::with_frame_interval(Duration::from_millis(2));
    let manager = Arc::new(CountingManager::default());
    let dispatcher = PollDispatcher::builder(manager.clone())
        .with_config(config)
        .build()
        .unwrap();
    frames
        .register_tick_listener(Arc::new(dispatcher.clone()))
        .unwrap();
    (frames, dispatcher, manager)
}

#[test]
fn frames_drive_cooperative_polling() {
    let (frames, dispatcher, manager) = bind(DispatcherConfig::cooperative());

    frames.run_frames(10).unwrap();

    assert_eq!(manager.setups.load(Ordering::SeqCst), 1);
    assert_eq!(manager.updates.load(Ordering::SeqCst), 10);
    assert_eq!(dispatcher.mode(), ThreadingMode::Cooperative);
}

#[test]
fn threaded_config_polls_between_frames() {
    let (frames, dispatcher, manager) =
        bind(DispatcherConfig::threaded().with_poll_interval(Duration::from_millis(5)));

    // First frame only performs setup; the loop does the polling
    frames.run_frame().unwrap();
    assert_eq!(dispatcher.mode(), ThreadingMode::Threaded);

    let reached = frames
        .run_until(2_000, |_| manager.updates.load(Ordering::SeqCst) >= 5)
        .is_ok();
    assert!(reached);

    let handle = dispatcher.loop_handle().unwrap();
    assert!(frames.request_quit());
    assert!(handle.wait_stopped(Duration::from_secs(2)));
    assert_eq!(manager.quits.load(Ordering::SeqCst), 1);
}

#[test]
fn pause_and_resume_reach_the_observer() {
    let (frames, dispatcher, _manager) = bind(DispatcherConfig::cooperative());
    let paused = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&paused);
    dispatcher.set_foreground_observer(move |is_paused| flag.store(is_paused, Ordering::SeqCst));

    frames.pause();
    assert!(paused.load(Ordering::SeqCst));
    frames.resume();
    assert!(!paused.load(Ordering::SeqCst));
}

#[test]
fn idle_mode_reentry_redoes_setup() {
    let (frames, dispatcher, manager) = bind(DispatcherConfig::cooperative());

    frames.enter_active_mode();
    frames.run_frames(3).unwrap();
    frames.enter_idle_mode();

    assert!(!dispatcher.is_setup());
    assert_eq!(manager.resets.load(Ordering::SeqCst), 1);

    frames.run_frame().unwrap();
    assert_eq!(manager.setups.load(Ordering::SeqCst), 2);
    assert_eq!(manager.updates.load(Ordering::SeqCst), 4);
}

#[rstest]
#[case::vetoed(false)]
#[case::allowed(true)]
fn quit_follows_before_quit(#[case] allow: bool) {
    let (frames, dispatcher, manager) = bind(DispatcherConfig::cooperative());
    dispatcher.set_before_quit(move || allow);
    frames.run_frames(2).unwrap();

    assert_eq!(frames.request_quit(), allow);
    assert_eq!(frames.is_closed(), allow);
    assert_eq!(dispatcher.is_running(), !allow);
    assert_eq!(manager.quits.load(Ordering::SeqCst), usize::from(allow));

    if !allow {
        frames.run_frame().unwrap();
        assert_eq!(manager.updates.load(Ordering::SeqCst), 3);
    }
}

#[test]
fn disable_while_active_shuts_down() {
    let (frames, dispatcher, manager) = bind(DispatcherConfig::cooperative());
    frames.run_frame().unwrap();

    // Ignored while idle
    assert!(frames.disable());
    assert!(dispatcher.is_running());

    frames.enter_active_mode();
    assert!(frames.disable());
    assert!(!dispatcher.is_running());
    assert_eq!(manager.quits.load(Ordering::SeqCst), 1);
}

#[test]
fn swap_from_host_thread_while_running_frames() {
    let (frames, dispatcher, manager) =
        bind(DispatcherConfig::cooperative().with_poll_interval(Duration::from_millis(3)));

    frames.run_frames(3).unwrap();
    assert_eq!(manager.updates.load(Ordering::SeqCst), 3);

    assert_eq!(dispatcher.swap_threading_mode(), ThreadingMode::Threaded);
    let handle = dispatcher.loop_handle().unwrap();
    frames.run_frames(10).unwrap();

    assert_eq!(dispatcher.swap_threading_mode(), ThreadingMode::Cooperative);
    assert!(dispatcher.loop_handle().is_none());
    assert!(handle.wait_stopped(Duration::from_secs(2)));

    // Only frames poll from here on
    let before = manager.updates.load(Ordering::SeqCst);
    frames.run_frames(4).unwrap();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(manager.updates.load(Ordering::SeqCst), before + 4);
}
