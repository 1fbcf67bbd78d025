//! Long-poll backend.
//!
//! The target URL is submitted as an asynchronous job; the adapter then polls
//! the job until it is done, failed, or the poll budget runs out.
//!
//! # API Endpoints
//!
//! - Submit: `POST {host}/jobs` with `{ "url": ... }`, answers `{ "id": ... }`
//! - Poll: `GET {host}/jobs/{id}`, answers
//!   `{ "status": "pending" | "done" | "failed", "statusCode": 200, "content": "..." }`

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::{BackendKind, ProviderConfig, RawResponse};
use crate::provider::error::read_response;
use crate::provider::{BackendAdapter, BackendError};

/// Statuses worth another attempt.
const RETRYABLE_STATUSES: &[u16] = &[500, 502, 503, 504, 429, 408];

/// Status reported when a job failed without telling us why.
const UNKNOWN_JOB_FAILURE_STATUS: u16 = 502;

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: String,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum JobStatus {
    Pending,
    Running,
    Done,
    Failed,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobResponse {
    status: JobStatus,
    #[serde(default)]
    status_code: Option<u16>,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Adapter for submit-then-poll APIs.
pub struct LongPollAdapter {
    client: Client,
    default_timeout: Duration,
    poll_interval: Duration,
    max_polls: u32,
}

impl LongPollAdapter {
    pub fn new(
        client: Client,
        default_timeout: Duration,
        poll_interval: Duration,
        max_polls: u32,
    ) -> Self {
        Self {
            client,
            default_timeout,
            poll_interval,
            max_polls,
        }
    }

    fn authorize(
        &self,
        request: reqwest::RequestBuilder,
        config: &ProviderConfig,
    ) -> reqwest::RequestBuilder {
        let request = request.timeout(config.timeout(self.default_timeout));
        match &config.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    async fn submit(&self, url: &str, config: &ProviderConfig) -> Result<String, BackendError> {
        let request = self
            .client
            .post(format!("{}/jobs", config.base_url()))
            .json(&SubmitRequest { url });
        let response = self.authorize(request, config).send().await?;
        let raw = read_response(&config.provider_name, response).await?;

        let submitted: SubmitResponse = serde_json::from_str(&raw.body)
            .map_err(|e| BackendError::malformed(format!("invalid job submission: {}", e)))?;
        Ok(submitted.id)
    }

    async fn poll(&self, job_id: &str, config: &ProviderConfig) -> Result<JobResponse, BackendError> {
        let request = self.client.get(format!(
            "{}/jobs/{}",
            config.base_url(),
            urlencoding::encode(job_id)
        ));
        let response = self.authorize(request, config).send().await?;
        let raw = read_response(&config.provider_name, response).await?;

        serde_json::from_str(&raw.body)
            .map_err(|e| BackendError::malformed(format!("invalid job status: {}", e)))
    }
}

#[async_trait]
impl BackendAdapter for LongPollAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::LongPoll
    }

    async fn fetch(&self, url: &str, config: &ProviderConfig) -> Result<RawResponse, BackendError> {
        let job_id = self.submit(url, config).await?;
        debug!("{}: submitted job {} for {}", config.provider_name, job_id, url);

        for poll in 1..=self.max_polls {
            let job = self.poll(&job_id, config).await?;

            match job.status {
                JobStatus::Pending | JobStatus::Running => {
                    debug!(
                        "{}: job {} still {:?} (poll {}/{})",
                        config.provider_name, job_id, job.status, poll, self.max_polls
                    );
                    if poll < self.max_polls {
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
                JobStatus::Done => {
                    let status = job.status_code.unwrap_or(200);
                    let body = job.content.unwrap_or_default();
                    if status >= 400 {
                        return Err(BackendError::http(
                            status,
                            format!("{} job {} target returned HTTP {}", config.provider_name, job_id, status),
                        ));
                    }
                    return Ok(RawResponse::new(status, job.content_type, body));
                }
                JobStatus::Failed => {
                    let status = job.status_code.unwrap_or(UNKNOWN_JOB_FAILURE_STATUS);
                    let message = job.error.unwrap_or_else(|| "job failed".to_string());
                    warn!("{}: job {} failed: {}", config.provider_name, job_id, message);
                    return Err(BackendError::http(status, message));
                }
            }
        }

        Err(BackendError::timeout(format!(
            "{} job {} not ready after {} polls",
            config.provider_name, job_id, self.max_polls
        )))
    }

    fn is_retryable(&self, error: &BackendError) -> bool {
        error.status_in(RETRYABLE_STATUSES) || error.is_transport_failure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(max_polls: u32) -> LongPollAdapter {
        LongPollAdapter::new(
            Client::new(),
            Duration::from_secs(5),
            Duration::from_millis(10),
            max_polls,
        )
    }

    fn config(host: String) -> ProviderConfig {
        let mut config = ProviderConfig::new(4, "poller", BackendKind::LongPoll, host);
        config.api_key = Some("poll-key".to_string());
        config
    }

    #[test]
    fn test_retry_predicate() {
        let adapter = adapter(3);
        for status in [500, 502, 503, 504, 429, 408] {
            assert!(adapter.is_retryable(&BackendError::http(status, "")));
        }
        for status in [400, 401, 404, 422] {
            assert!(!adapter.is_retryable(&BackendError::http(status, "")));
        }
        assert!(adapter.is_retryable(&BackendError::timeout("not ready")));
    }

    #[tokio::test]
    async fn test_submit_then_poll_until_done() {
        let mut server = mockito::Server::new_async().await;
        let submit = server
            .mock("POST", "/jobs")
            .match_header(API_KEY_HEADER, "poll-key")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "url": "https://shop.example.com/item/4"
            })))
            .with_status(202)
            .with_body(r#"{"id":"job-1"}"#)
            .create_async()
            .await;
        let poll = server
            .mock("GET", "/jobs/job-1")
            .match_header(API_KEY_HEADER, "poll-key")
            .with_status(200)
            .with_body(
                r#"{"status":"done","statusCode":200,"contentType":"application/xml","content":"<?xml version=\"1.0\"?><r/>"}"#,
            )
            .create_async()
            .await;

        let response = adapter(5)
            .fetch("https://shop.example.com/item/4", &config(server.url()))
            .await
            .unwrap();

        submit.assert_async().await;
        poll.assert_async().await;
        assert_eq!(response.content_type.as_deref(), Some("application/xml"));
        assert!(response.body.starts_with("<?xml"));
    }

    #[tokio::test]
    async fn test_failed_job_reports_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/jobs")
            .with_status(200)
            .with_body(r#"{"id":"job-2"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/jobs/job-2")
            .with_status(200)
            .with_body(r#"{"status":"failed","statusCode":503,"error":"target down"}"#)
            .create_async()
            .await;

        let err = adapter(3)
            .fetch("https://shop.example.com/item/5", &config(server.url()))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert_eq!(err.message, "target down");
    }

    #[tokio::test]
    async fn test_poll_budget_exhaustion_is_timeout() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/jobs")
            .with_status(200)
            .with_body(r#"{"id":"job-3"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/jobs/job-3")
            .with_status(200)
            .with_body(r#"{"status":"running"}"#)
            .expect(2)
            .create_async()
            .await;

        let err = adapter(2)
            .fetch("https://shop.example.com/item/6", &config(server.url()))
            .await
            .unwrap_err();

        assert!(err.is_socket_timeout());
        assert!(adapter(2).is_retryable(&err));
    }

    #[tokio::test]
    async fn test_last_poll_does_not_wait_for_another_interval() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/jobs")
            .with_status(200)
            .with_body(r#"{"id":"job-4"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/jobs/job-4")
            .with_status(200)
            .with_body(r#"{"status":"pending"}"#)
            .expect(1)
            .create_async()
            .await;

        let adapter = LongPollAdapter::new(
            Client::new(),
            Duration::from_secs(5),
            Duration::from_secs(30),
            1,
        );
        let cfg = config(server.url());
        let fetch = adapter.fetch("https://shop.example.com/item/7", &cfg);
        let err = tokio::time::timeout(Duration::from_secs(5), fetch)
            .await
            .expect("adapter slept after its last poll")
            .unwrap_err();

        assert!(err.is_socket_timeout());
    }
}
