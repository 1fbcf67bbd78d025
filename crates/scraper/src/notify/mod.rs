//! Notification of failover outcomes.
//!
//! The dispatcher splits a batch of [`SwitchOutcome`]s into jobs that moved to
//! another provider and jobs that ran out of alternates, and sends each
//! non-empty group to its channel. Delivery is best-effort: failures are
//! logged and never reach the failover that produced the batch.

mod cache;
mod webhook;

pub use cache::{CacheInvalidator, HttpCacheInvalidator, NoopCacheInvalidator};
pub use webhook::{WebhookSink, WebhookUrls};

use async_trait::async_trait;
use log::{info, warn};
use std::fmt;
use std::sync::Arc;

use crate::errors::Result;
use crate::models::SwitchOutcome;

/// Where a batch of outcomes is delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotificationChannel {
    /// Jobs that moved to their next alternate
    ProviderChanged,
    /// Jobs with no alternate left
    ThresholdExhausted,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProviderChanged => "provider-changed",
            Self::ThresholdExhausted => "threshold-exhausted",
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivers outcome batches to a channel.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, channel: NotificationChannel, outcomes: &[SwitchOutcome]) -> Result<()>;
}

/// Sink that only logs, used when no webhooks are configured.
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn send(&self, channel: NotificationChannel, outcomes: &[SwitchOutcome]) -> Result<()> {
        for outcome in outcomes {
            info!(
                "[{}] job '{}': {} -> {}",
                channel,
                outcome.job_name,
                outcome.previous_provider_name,
                outcome.new_provider_name.as_deref().unwrap_or("none")
            );
        }
        Ok(())
    }
}

/// Routes switch outcomes to their notification channels.
pub struct NotificationDispatcher {
    sink: Arc<dyn NotificationSink>,
}

impl NotificationDispatcher {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Send a batch, partitioned by `threshold_reached`. Both channels are
    /// delivered concurrently.
    pub async fn dispatch(&self, outcomes: &[SwitchOutcome]) {
        let (exhausted, changed): (Vec<SwitchOutcome>, Vec<SwitchOutcome>) = outcomes
            .iter()
            .cloned()
            .partition(|outcome| outcome.threshold_reached);

        futures::future::join(
            self.send(NotificationChannel::ProviderChanged, &changed),
            self.send(NotificationChannel::ThresholdExhausted, &exhausted),
        )
        .await;
    }

    async fn send(&self, channel: NotificationChannel, outcomes: &[SwitchOutcome]) {
        if outcomes.is_empty() {
            return;
        }
        if let Err(e) = self.sink.send(channel, outcomes).await {
            warn!(
                "Notification to {} failed for {} job(s): {}",
                channel,
                outcomes.len(),
                e
            );
        }
    }
}
