use poll_dispatcher::HostError;
use thiserror::Error;

/// Errors from running a frame loop
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The loop rejected the call (wrong thread, or already closed)
    #[error(transparent)]
    Host(#[from] HostError),

    /// `run_until` gave up before its condition held
    #[error("Condition not met within {0} frames")]
    FrameLimit(u64),
}

/// Result type for frame loop operations
pub type Result<T> = std::result::Result<T, FrameError>;
