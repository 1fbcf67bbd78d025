//! Generic-scrape backend.
//!
//! A single GET with the API key and the target URL in the query string. The
//! provider proxies the request and returns the target's body verbatim.
//!
//! # API Endpoints
//!
//! - Scrape: `GET {host}?api_key={api_key}&url={url}`

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::time::Duration;

use crate::models::{BackendKind, ProviderConfig, RawResponse};
use crate::provider::error::read_response;
use crate::provider::{BackendAdapter, BackendError};

/// Validation failure on the provider side; the request itself is wrong.
const UNPROCESSABLE: u16 = 422;

/// Adapter for query-string scrape APIs.
pub struct GenericScrapeAdapter {
    client: Client,
    default_timeout: Duration,
}

impl GenericScrapeAdapter {
    pub fn new(client: Client, default_timeout: Duration) -> Self {
        Self {
            client,
            default_timeout,
        }
    }
}

#[async_trait]
impl BackendAdapter for GenericScrapeAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::GenericScrape
    }

    async fn fetch(&self, url: &str, config: &ProviderConfig) -> Result<RawResponse, BackendError> {
        debug!("{}: GET {}", config.provider_name, url);

        let mut query: Vec<(&str, &str)> = Vec::with_capacity(2);
        if let Some(key) = &config.api_key {
            query.push(("api_key", key.as_str()));
        }
        query.push(("url", url));

        let response = self
            .client
            .get(config.base_url())
            .timeout(config.timeout(self.default_timeout))
            .query(&query)
            .send()
            .await?;

        read_response(&config.provider_name, response).await
    }

    /// Anything that is not a success, except a 422, is retried.
    fn is_retryable(&self, error: &BackendError) -> bool {
        let status_retryable = error
            .status()
            .is_some_and(|s| s >= 300 && s != UNPROCESSABLE);
        status_retryable || error.is_socket_timeout() || error.is_transport_failure()
    }
}
