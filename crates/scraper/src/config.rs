//! Tunables for the resilience layer.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Default retry budget per request (attempts after the first).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default backoff unit; attempt `n` sleeps `n * interval`.
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 5_000;

/// Default failure-window length before the sweep zeroes a counter.
pub const DEFAULT_RESET_WINDOW_MS: u64 = 3_600_000;

/// Threshold given to a provider's record when it is first created.
pub const DEFAULT_THRESHOLD: u32 = 10;

/// Default HTTP timeout for backend calls.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Resilience configuration shared by the counter, executors and adapters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResilienceConfig {
    pub max_retries: u32,
    pub retry_interval_ms: u64,
    pub reset_window_ms: u64,
    pub default_threshold: u32,
    pub request_timeout_secs: u64,
    /// Delay between two polls of a long-poll backend
    pub poll_interval_ms: u64,
    /// Polls before a long-poll job is considered timed out
    pub max_polls: u32,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            reset_window_ms: DEFAULT_RESET_WINDOW_MS,
            default_threshold: DEFAULT_THRESHOLD,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            poll_interval_ms: 2_000,
            max_polls: 30,
        }
    }
}

impl ResilienceConfig {
    pub fn reset_window(&self) -> Duration {
        Duration::from_millis(self.reset_window_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Retry policy derived from this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.retry_interval_ms),
        )
    }
}
