use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::types::ProviderId;

/// Failure accounting for a single provider.
///
/// Created on the first failure, zeroed on reset, never deleted. `window_start`
/// moves only on a reset or on the first failure after one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureRecord {
    pub provider_id: ProviderId,
    pub provider_name: String,
    pub failure_count: u32,

    /// Count above which the provider's jobs are failed over
    pub threshold_count: u32,

    pub window_start: DateTime<Utc>,

    /// Actor that performed the last reset ("SYSTEM" for the sweep)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reset_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reset_at: Option<DateTime<Utc>>,
}

impl FailureRecord {
    /// Create a record for a provider's first failure.
    pub fn first_failure(
        provider_id: ProviderId,
        provider_name: impl Into<String>,
        threshold_count: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            provider_id,
            provider_name: provider_name.into(),
            failure_count: 1,
            threshold_count,
            window_start: now,
            last_reset_by: None,
            last_reset_at: None,
        }
    }

    /// True when the provider is degraded enough to fail its jobs over.
    pub fn is_over_threshold(&self) -> bool {
        self.failure_count > self.threshold_count
    }

    /// True when more than `window` has passed since the window started.
    pub fn window_elapsed(&self, now: DateTime<Utc>, window: Duration) -> bool {
        match chrono::Duration::from_std(window) {
            Ok(window) => now.signed_duration_since(self.window_start) > window,
            Err(_) => false,
        }
    }

    /// The record after one more failure.
    ///
    /// A zeroed record starts a fresh window; otherwise the window is kept.
    pub fn incremented(&self, now: DateTime<Utc>) -> Self {
        if self.failure_count == 0 {
            Self {
                failure_count: 1,
                window_start: now,
                ..self.clone()
            }
        } else {
            Self {
                failure_count: self.failure_count.saturating_add(1),
                ..self.clone()
            }
        }
    }

    /// The record after a reset performed by `actor`.
    pub fn reset(&self, actor: &str, now: DateTime<Utc>) -> Self {
        Self {
            failure_count: 0,
            window_start: now,
            last_reset_by: Some(actor.to_string()),
            last_reset_at: Some(now),
            ..self.clone()
        }
    }
}
