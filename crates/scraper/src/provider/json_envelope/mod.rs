//! Structured-JSON-envelope backend.
//!
//! The target URL is wrapped in a JSON job envelope and POSTed to the provider
//! with basic authentication. The provider answers synchronously with an
//! envelope holding the scraped content.
//!
//! # API Endpoints
//!
//! - Query: `POST {host}/v1/queries`
//!
//! # Response Format
//!
//! ```json
//! { "results": [ { "content": "<?xml ...", "status_code": 200 } ] }
//! ```

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::models::{BackendKind, ProviderConfig, RawResponse};
use crate::provider::error::{read_response, snippet};
use crate::provider::{BackendAdapter, BackendError};

/// Statuses worth another attempt.
const RETRYABLE_STATUSES: &[u16] = &[503, 500, 429, 408];

/// Source name the envelope API expects for arbitrary URLs.
const UNIVERSAL_SOURCE: &str = "universal";

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    source: &'a str,
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct EnvelopeResponse {
    #[serde(default)]
    results: Vec<EnvelopeResult>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeResult {
    #[serde(default)]
    content: Option<serde_json::Value>,
    #[serde(default)]
    status_code: Option<u16>,
}

/// Adapter for the JSON envelope API.
pub struct JsonEnvelopeAdapter {
    client: Client,
    default_timeout: Duration,
}

impl JsonEnvelopeAdapter {
    pub fn new(client: Client, default_timeout: Duration) -> Self {
        Self {
            client,
            default_timeout,
        }
    }

    /// Pull the scraped body out of the envelope.
    fn unwrap_envelope(
        provider: &str,
        envelope: EnvelopeResponse,
    ) -> Result<RawResponse, BackendError> {
        let result = envelope.results.into_iter().next().ok_or_else(|| {
            BackendError::malformed(format!("{} returned an empty envelope", provider))
        })?;

        let status = result.status_code.unwrap_or(200);
        let body = match result.content {
            Some(serde_json::Value::String(text)) => text,
            Some(other) => other.to_string(),
            None => String::new(),
        };

        if status >= 400 {
            return Err(BackendError::http(
                status,
                format!(
                    "{} target returned HTTP {}: {}",
                    provider,
                    status,
                    snippet(&body)
                ),
            ));
        }

        Ok(RawResponse::new(status, None, body))
    }
}

#[async_trait]
impl BackendAdapter for JsonEnvelopeAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::JsonEnvelope
    }

    async fn fetch(&self, url: &str, config: &ProviderConfig) -> Result<RawResponse, BackendError> {
        let endpoint = format!("{}/v1/queries", config.base_url());
        debug!("{}: POST envelope for {}", config.provider_name, url);

        let mut request = self
            .client
            .post(&endpoint)
            .timeout(config.timeout(self.default_timeout))
            .json(&Envelope {
                source: UNIVERSAL_SOURCE,
                url,
            });
        if let Some(username) = &config.username {
            request = request.basic_auth(username, config.password.as_deref());
        }

        let response = read_response(&config.provider_name, request.send().await?).await?;
        let envelope: EnvelopeResponse = serde_json::from_str(&response.body)
            .map_err(|e| BackendError::malformed(format!("invalid envelope: {}", e)))?;

        Self::unwrap_envelope(&config.provider_name, envelope)
    }

    /// Only throttling and server-side statuses are retried. A failure with
    /// no response at all is retried too.
    fn is_retryable(&self, error: &BackendError) -> bool {
        error.status_in(RETRYABLE_STATUSES) || error.is_transport_failure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn adapter() -> JsonEnvelopeAdapter {
        JsonEnvelopeAdapter::new(Client::new(), Duration::from_secs(5))
    }

    #[test]
    fn test_retry_predicate() {
        let adapter = adapter();
        for status in [503, 500, 429, 408] {
            assert!(adapter.is_retryable(&BackendError::http(status, "")));
        }
        for status in [400, 401, 404, 422, 502] {
            assert!(!adapter.is_retryable(&BackendError::http(status, "")));
        }
        assert!(adapter.is_retryable(&BackendError::connection("refused")));
        assert!(adapter.is_retryable(&BackendError::timeout("deadline")));
        assert!(!adapter.is_retryable(&BackendError::malformed("bad")));
    }

    #[tokio::test]
    async fn test_fetch_unwraps_envelope() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/queries")
            .match_header("authorization", Matcher::Regex("^Basic ".to_string()))
            .match_body(Matcher::PartialJson(serde_json::json!({
                "source": "universal",
                "url": "https://shop.example.com/item/1"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"results":[{"content":"<?xml version=\"1.0\"?><a/>","status_code":200}]}"#)
            .create_async()
            .await;

        let mut config =
            ProviderConfig::new(1, "envelope-us", BackendKind::JsonEnvelope, server.url());
        config.username = Some("user".to_string());
        config.password = Some("secret".to_string());

        let response = adapter()
            .fetch("https://shop.example.com/item/1", &config)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 200);
        assert!(response.body.starts_with("<?xml"));
    }

    #[tokio::test]
    async fn test_target_status_becomes_http_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/queries")
            .with_status(200)
            .with_body(r#"{"results":[{"content":"blocked","status_code":429}]}"#)
            .create_async()
            .await;

        let config = ProviderConfig::new(1, "envelope-us", BackendKind::JsonEnvelope, server.url());
        let err = adapter()
            .fetch("https://shop.example.com/item/1", &config)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(429));
        assert!(adapter().is_retryable(&err));
    }

    #[tokio::test]
    async fn test_provider_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/queries")
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let config = ProviderConfig::new(1, "envelope-us", BackendKind::JsonEnvelope, server.url());
        let err = adapter()
            .fetch("https://shop.example.com/item/1", &config)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn test_empty_envelope_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/queries")
            .with_status(200)
            .with_body(r#"{"results":[]}"#)
            .create_async()
            .await;

        let config = ProviderConfig::new(1, "envelope-us", BackendKind::JsonEnvelope, server.url());
        let err = adapter()
            .fetch("https://shop.example.com/item/1", &config)
            .await
            .unwrap_err();

        assert_eq!(err.kind, crate::provider::BackendErrorKind::Malformed);
        assert!(!adapter().is_retryable(&err));
    }
}
