//! Downstream cache invalidation after a binding changes.

use log::{debug, warn};
use reqwest::Client;
use std::time::Duration;

use crate::errors::{Result, ScrapeError};
use crate::models::CronBinding;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Signals that a job's cached data is stale.
///
/// Best-effort: implementations must not block the caller and must swallow
/// their own failures.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate(&self, binding: &CronBinding);
}

/// Invalidator that does nothing, for deployments without a downstream cache.
pub struct NoopCacheInvalidator;

impl CacheInvalidator for NoopCacheInvalidator {
    fn invalidate(&self, binding: &CronBinding) {
        debug!("Cache invalidation skipped for '{}'", binding.job_name);
    }
}

/// Calls `GET {url}?jobName={job}` on a background task.
#[derive(Clone)]
pub struct HttpCacheInvalidator {
    client: Client,
    url: String,
}

impl HttpCacheInvalidator {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Perform the invalidation call and wait for it.
    pub async fn invalidate_now(&self, job_name: &str) -> Result<()> {
        let response = self
            .client
            .get(&self.url)
            .timeout(REQUEST_TIMEOUT)
            .query(&[("jobName", job_name)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Notification(format!(
                "cache invalidation for '{}' returned HTTP {}",
                job_name,
                status.as_u16()
            )));
        }
        Ok(())
    }
}

impl CacheInvalidator for HttpCacheInvalidator {
    fn invalidate(&self, binding: &CronBinding) {
        let invalidator = self.clone();
        let job_name = binding.job_name.clone();

        tokio::spawn(async move {
            match invalidator.invalidate_now(&job_name).await {
                Ok(()) => debug!("Cache invalidated for '{}'", job_name),
                Err(e) => warn!("Cache invalidation failed for '{}': {}", job_name, e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn binding(job_name: &str) -> CronBinding {
        CronBinding {
            job_id: 1,
            job_name: job_name.to_string(),
            current_provider_id: 1,
            current_sequence: 0,
            alternates: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_invalidate_now_passes_job_name() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/cache/clear")
            .match_query(Matcher::UrlEncoded("jobName".into(), "hourly top sellers".into()))
            .with_status(204)
            .create_async()
            .await;

        let invalidator =
            HttpCacheInvalidator::new(Client::new(), format!("{}/cache/clear", server.url()));
        invalidator.invalidate_now("hourly top sellers").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalidate_runs_in_background() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/cache/clear")
            .match_query(Matcher::UrlEncoded("jobName".into(), "nightly-catalog".into()))
            .with_status(200)
            .create_async()
            .await;

        let invalidator =
            HttpCacheInvalidator::new(Client::new(), format!("{}/cache/clear", server.url()));
        invalidator.invalidate(&binding("nightly-catalog"));

        for _ in 0..100 {
            if mock.matched_async().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_invalidation_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/cache/clear")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let invalidator =
            HttpCacheInvalidator::new(Client::new(), format!("{}/cache/clear", server.url()));
        let err = invalidator.invalidate_now("nightly-catalog").await.unwrap_err();
        assert!(matches!(err, ScrapeError::Notification(_)));
    }
}
