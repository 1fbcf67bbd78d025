//! Webhook delivery of switch outcomes.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::time::Duration;

use crate::errors::{Result, ScrapeError};
use crate::models::SwitchOutcome;

use super::{NotificationChannel, NotificationSink};

/// HTTP timeout for one webhook call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Endpoints of the two notification channels. A channel without a URL is
/// silently skipped.
#[derive(Clone, Debug, Default)]
pub struct WebhookUrls {
    pub provider_changed: Option<String>,
    pub threshold_exhausted: Option<String>,
}

/// Posts each batch as a JSON array of [`SwitchOutcome`].
pub struct WebhookSink {
    client: Client,
    urls: WebhookUrls,
}

impl WebhookSink {
    pub fn new(client: Client, urls: WebhookUrls) -> Self {
        Self { client, urls }
    }

    fn url_for(&self, channel: NotificationChannel) -> Option<&str> {
        match channel {
            NotificationChannel::ProviderChanged => self.urls.provider_changed.as_deref(),
            NotificationChannel::ThresholdExhausted => self.urls.threshold_exhausted.as_deref(),
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn send(&self, channel: NotificationChannel, outcomes: &[SwitchOutcome]) -> Result<()> {
        let Some(url) = self.url_for(channel) else {
            debug!("No webhook configured for {}, skipping", channel);
            return Ok(());
        };

        let response = self
            .client
            .post(url)
            .timeout(REQUEST_TIMEOUT)
            .json(outcomes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Notification(format!(
                "{} webhook returned HTTP {}",
                channel,
                status.as_u16()
            )));
        }

        debug!("Delivered {} outcome(s) to {}", outcomes.len(), channel);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn outcome() -> SwitchOutcome {
        SwitchOutcome::changed(3, "nightly-catalog", "envelope-us", "render-eu")
    }

    #[tokio::test]
    async fn test_posts_json_array() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/changed")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!([{
                "jobId": 3,
                "jobName": "nightly-catalog",
                "previousProviderName": "envelope-us",
                "newProviderName": "render-eu",
                "thresholdReached": false
            }])))
            .with_status(200)
            .create_async()
            .await;

        let sink = WebhookSink::new(
            Client::new(),
            WebhookUrls {
                provider_changed: Some(format!("{}/changed", server.url())),
                threshold_exhausted: None,
            },
        );

        sink.send(NotificationChannel::ProviderChanged, &[outcome()])
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_url_is_skipped() {
        let sink = WebhookSink::new(Client::new(), WebhookUrls::default());
        sink.send(NotificationChannel::ThresholdExhausted, &[outcome()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_error_status_is_notification_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/exhausted")
            .with_status(500)
            .create_async()
            .await;

        let sink = WebhookSink::new(
            Client::new(),
            WebhookUrls {
                provider_changed: None,
                threshold_exhausted: Some(format!("{}/exhausted", server.url())),
            },
        );

        let err = sink
            .send(NotificationChannel::ThresholdExhausted, &[outcome()])
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Notification(_)));
    }
}
