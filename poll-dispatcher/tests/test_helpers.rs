//! Shared helpers for the dispatcher integration tests

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use poll_dispatcher::{Manager, ManagerError};

/// How an update invocation should misbehave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Error,
    Panic,
}

/// Instrumented manager recording every call the dispatcher makes
#[derive(Default)]
pub struct ProbeManager {
    pub setups: AtomicUsize,
    pub quits: AtomicUsize,
    pub resets: AtomicUsize,
    pub invocations: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    delay: Duration,
    failures: HashSet<usize>,
    failure_kind: Option<Failure>,
    threads: Mutex<Vec<ThreadId>>,
}

impl ProbeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every update sleeps for `delay` while marked active
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail the given (1-based) invocations
    pub fn failing_on(mut self, invocations: &[usize], kind: Failure) -> Self {
        self.failures = invocations.iter().copied().collect();
        self.failure_kind = Some(kind);
        self
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Highest number of overlapping updates ever observed
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Number of updates that ran on `thread`
    pub fn invocations_on(&self, thread: ThreadId) -> usize {
        self.threads
            .lock()
            .unwrap()
            .iter()
            .filter(|t| **t == thread)
            .count()
    }

    /// Number of updates that ran anywhere but `thread`
    pub fn invocations_off(&self, thread: ThreadId) -> usize {
        self.threads
            .lock()
            .unwrap()
            .iter()
            .filter(|t| **t != thread)
            .count()
    }
}

impl Manager for ProbeManager {
    fn setup(&self) -> Result<(), ManagerError> {
        self.setups.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn on_update(&self) -> Result<(), ManagerError> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);
        let n = self.invocations.fetch_add(1, Ordering::SeqCst) + 1;
        self.threads.lock().unwrap().push(thread::current().id());

        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        match (self.failures.contains(&n), self.failure_kind) {
            (true, Some(Failure::Error)) => Err(format!("update {} failed", n).into()),
            (true, Some(Failure::Panic)) => panic!("update {} panicked", n),
            _ => Ok(()),
        }
    }

    fn on_quit(&self) {
        self.quits.fetch_add(1, Ordering::SeqCst);
    }

    fn reset_setup(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_for(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}
