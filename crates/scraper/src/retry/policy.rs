//! Retry budget, backoff and escalation thresholds.

use std::time::Duration;

use crate::config::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_INTERVAL_MS};
use crate::errors::RetryClass;

/// Failures at an attempt index above this escalate to the orchestrator.
/// Attempts are numbered from 0, so the third attempt is the first to escalate.
pub const DEFAULT_ESCALATE_AFTER_ATTEMPT: u32 = 1;

/// Where the executor stands after a failed attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryState {
    /// A fetch is in flight.
    Attempting,
    /// The failure is retryable and budget remains; back off then try again.
    Retrying,
    /// Same as `Retrying`, but the provider is reported for failover first.
    Escalating,
    /// Budget consumed or the failure is permanent.
    Exhausted,
}

/// What to do after a failed attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryDecision {
    pub state: RetryState,
    /// Sleep before the next attempt; zero when giving up
    pub backoff: Duration,
}

/// Retry policy shared by every executor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one
    pub max_retries: u32,
    /// Backoff unit: failing attempt `n` sleeps `n * retry_interval`
    pub retry_interval: Duration,
    pub escalate_after_attempt: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_RETRIES,
            Duration::from_millis(DEFAULT_RETRY_INTERVAL_MS),
        )
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_interval: Duration) -> Self {
        Self {
            max_retries,
            retry_interval,
            escalate_after_attempt: DEFAULT_ESCALATE_AFTER_ATTEMPT,
        }
    }

    /// Total number of fetches the policy allows.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Backoff after attempt `attempt` failed.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.retry_interval.saturating_mul(attempt)
    }

    /// Decide the next state after attempt `attempt` failed with `class`.
    pub fn decide(&self, attempt: u32, class: RetryClass) -> RetryDecision {
        if !class.is_retryable() || attempt >= self.max_retries {
            return RetryDecision {
                state: RetryState::Exhausted,
                backoff: Duration::ZERO,
            };
        }

        let state = if attempt > self.escalate_after_attempt {
            RetryState::Escalating
        } else {
            RetryState::Retrying
        };
        RetryDecision {
            state,
            backoff: self.backoff(attempt),
        }
    }
}
