//! Configuration for the poll dispatcher
//!
//! Controls whether polling runs on a background thread and how long that
//! thread waits between two polls.

use std::time::Duration;

use crate::error::{DispatcherError, Result};

/// Environment variable read by [`DispatcherConfig::from_env`] for the threaded flag
pub const ENV_THREADED: &str = "POLL_DISPATCHER_THREADED";

/// Environment variable read by [`DispatcherConfig::from_env`] for the poll interval
pub const ENV_INTERVAL_MS: &str = "POLL_DISPATCHER_INTERVAL_MS";

/// Upper bound accepted for the poll interval
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for a [`PollDispatcher`](crate::PollDispatcher)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Poll from a dedicated background thread instead of the host tick
    /// Default: false
    pub threaded: bool,

    /// Wait between two background polls
    /// Default: 100 milliseconds
    pub poll_interval: Duration,

    /// Whether the platform can run background threads at all. When false,
    /// `threaded` is ignored at setup.
    /// Default: true everywhere except wasm targets
    pub threads_supported: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            threaded: false,
            poll_interval: Duration::from_millis(100),
            threads_supported: cfg!(not(target_family = "wasm")),
        }
    }
}

impl DispatcherConfig {
    /// Create a new DispatcherConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Polls driven only by the host tick
    pub fn cooperative() -> Self {
        Self::default()
    }

    /// Polls driven by a background thread from setup onwards
    pub fn threaded() -> Self {
        Self {
            threaded: true,
            ..Default::default()
        }
    }

    pub fn with_threaded(mut self, threaded: bool) -> Self {
        self.threaded = threaded;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_threads_supported(mut self, supported: bool) -> Self {
        self.threads_supported = supported;
        self
    }

    /// Whether setup should start in threaded mode
    pub fn effective_threaded(&self) -> bool {
        self.threaded && self.threads_supported
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval > MAX_POLL_INTERVAL {
            return Err(DispatcherError::InvalidConfig(format!(
                "Poll interval {:?} exceeds the maximum of {:?}",
                self.poll_interval, MAX_POLL_INTERVAL
            )));
        }

        Ok(())
    }

    /// Build a configuration from the process environment
    ///
    /// - `POLL_DISPATCHER_THREADED`: `1`/`true`/`yes` or `0`/`false`/`no`
    /// - `POLL_DISPATCHER_INTERVAL_MS`: poll interval in milliseconds
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_THREADED) {
            config.threaded = parse_flag(&raw).ok_or_else(|| {
                DispatcherError::InvalidConfig(format!("{ENV_THREADED}={raw} is not a boolean"))
            })?;
        }

        if let Some(raw) = lookup(ENV_INTERVAL_MS) {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                DispatcherError::InvalidConfig(format!("{ENV_INTERVAL_MS}={raw} is not a number"))
            })?;
            config.poll_interval = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DispatcherConfig::default();
        assert!(!config.threaded);
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threaded_forced_off_without_thread_support() {
        let config = DispatcherConfig::threaded().with_threads_supported(false);
        assert!(config.threaded);
        assert!(!config.effective_threaded());
    }

    #[test]
    fn test_zero_interval_is_valid() {
        let config = DispatcherConfig::new().with_poll_interval(Duration::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_oversized_interval_rejected() {
        let config = DispatcherConfig::new().with_poll_interval(Duration::from_secs(3600));
        assert!(matches!(
            config.validate(),
            Err(DispatcherError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_lookup() {
        let config = DispatcherConfig::from_lookup(lookup_from(&[
            (ENV_THREADED, "yes"),
            (ENV_INTERVAL_MS, "250"),
        ]))
        .unwrap();
        assert!(config.threaded);
        assert_eq!(config.poll_interval, Duration::from_millis(250));

        let config = DispatcherConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, DispatcherConfig::default());
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let result = DispatcherConfig::from_lookup(lookup_from(&[(ENV_THREADED, "maybe")]));
        assert!(result.is_err());

        let result = DispatcherConfig::from_lookup(lookup_from(&[(ENV_INTERVAL_MS, "fast")]));
        assert!(result.is_err());
    }
}
