use thiserror::Error;

/// Error type returned by a [`Manager`](crate::Manager) hook.
pub type ManagerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in the poll dispatcher
///
/// None of these reach the host through the lifecycle operations; they are
/// logged at the operation boundary and the dispatcher falls back to a
/// well-defined state.
#[derive(Error, Debug)]
pub enum DispatcherError {
    /// Instance creation or setup attempted outside a valid host context
    #[error("Setup outside a valid host context: {0}")]
    SetupContext(String),

    /// The before-quit predicate vetoed or failed during shutdown
    #[error("Shutdown aborted: {0}")]
    ShutdownAborted(String),

    /// The polling callback returned an error or panicked
    #[error("Poll callback failed: {0}")]
    PollFailure(String),

    /// The background loop's own control logic failed
    #[error("Background poll loop failed: {0}")]
    BackgroundLoop(String),

    /// The background thread could not be spawned
    #[error("Failed to spawn poll thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),

    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    InvalidConfig(String),
}

/// Errors raised by a host binding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Called from a thread the host does not accept calls from
    #[error("Host call made off the owning thread ({0})")]
    WrongThread(String),

    /// A tick listener is already registered with the host
    #[error("A tick listener is already registered")]
    ListenerAlreadyRegistered,

    /// The host tick source has been shut down
    #[error("Host tick source is closed")]
    Closed,
}

impl From<HostError> for DispatcherError {
    fn from(err: HostError) -> Self {
        DispatcherError::SetupContext(err.to_string())
    }
}

/// Result type for dispatcher operations
pub type Result<T> = std::result::Result<T, DispatcherError>;

/// Run `f`, turning a panic into its message.
pub(crate) fn catch_panic<T>(f: impl FnOnce() -> T) -> std::result::Result<T, String> {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(f))
        .map_err(|payload| panic_message(payload.as_ref()))
}

/// Render a caught panic payload as text for logging.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
