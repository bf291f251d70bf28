//! Drive a dispatcher from a fake frame loop, move polling onto a
//! background thread halfway through, then shut down.
//!
//! Run with `POLL_DISPATCHER_LOG_MODE=development` to see the dispatcher logs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use poll_dispatcher::{DispatcherConfig, Manager, ManagerError, PollDispatcher};

#[derive(Default)]
struct PendingRequests {
    completed: AtomicU64,
}

impl Manager for PendingRequests {
    fn setup(&self) -> Result<(), ManagerError> {
        println!("manager: setup");
        Ok(())
    }

    fn on_update(&self) -> Result<(), ManagerError> {
        self.completed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn on_quit(&self) {
        println!("manager: quit after {} updates", self.completed.load(Ordering::Relaxed));
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    poll_dispatcher::init_logging_from_env()?;

    let manager = Arc::new(PendingRequests::default());
    let dispatcher = PollDispatcher::builder(manager.clone())
        .with_config(DispatcherConfig::from_env()?.with_poll_interval(Duration::from_millis(20)))
        .with_before_quit(|| {
            println!("host: allowing quit");
            true
        })
        .build()?;

    // ~60 fps for half a second
    for frame in 0..60 {
        if frame == 30 {
            let mode = dispatcher.swap_threading_mode();
            println!("frame {}: polling is now {}", frame, mode);
        }
        dispatcher.tick();
        thread::sleep(Duration::from_millis(8));
    }

    println!("stats: {:?}", dispatcher.stats());

    let handle = dispatcher.loop_handle();
    if dispatcher.request_shutdown() {
        if let Some(handle) = handle {
            handle.wait_stopped(Duration::from_secs(1));
        }
    }

    Ok(())
}
