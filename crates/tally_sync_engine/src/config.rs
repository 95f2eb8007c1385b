//! Configuration for the sync engine.

use std::time::Duration;

/// Key prefix under which cached session counts are stored.
pub const DEFAULT_CACHE_KEY_PREFIX: &str = "voice-counter-";

/// Configuration for session sync behavior.
///
/// The defaults match the production protocol: a 1 s debounce window
/// collapsing bursts of edits into one push, a 5 s cap on each push
/// attempt, and a fixed 10 s retry cadence after failures.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Quiescence window after a local edit before a push is attempted.
    pub debounce_window: Duration,
    /// Maximum time to wait for a push attempt before treating it as
    /// failed. The underlying call is not aborted, only ignored.
    pub push_timeout: Duration,
    /// Fixed delay between retry attempts after a failed push.
    pub retry_delay: Duration,
    /// Key prefix for durable cache entries.
    pub cache_key_prefix: String,
}

impl SyncConfig {
    /// Creates a configuration with production defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            debounce_window: Duration::from_millis(1000),
            push_timeout: Duration::from_millis(5000),
            retry_delay: Duration::from_millis(10_000),
            cache_key_prefix: DEFAULT_CACHE_KEY_PREFIX.to_string(),
        }
    }

    /// Sets the debounce window.
    #[must_use]
    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }

    /// Sets the push timeout.
    #[must_use]
    pub fn with_push_timeout(mut self, timeout: Duration) -> Self {
        self.push_timeout = timeout;
        self
    }

    /// Sets the retry delay.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sets the durable cache key prefix.
    #[must_use]
    pub fn with_cache_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_key_prefix = prefix.into();
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
