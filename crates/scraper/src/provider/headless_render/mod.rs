//! Headless-render backend.
//!
//! Pages are loaded in a remote headless browser session and the rendered DOM
//! is returned as HTML. Authentication is a token in the query string.
//!
//! # API Endpoints
//!
//! - Render: `POST {host}/content?token={api_key}`

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::models::{BackendKind, ProviderConfig, RawResponse};
use crate::provider::error::read_response;
use crate::provider::{BackendAdapter, BackendError};

/// Statuses worth another attempt. Render sessions also fail with 400/401
/// while the browser pool is being recycled.
const RETRYABLE_STATUSES: &[u16] = &[503, 500, 429, 408, 400, 401];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderRequest<'a> {
    url: &'a str,
    goto_options: GotoOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GotoOptions {
    wait_until: &'static str,
    timeout: u64,
}

/// Adapter for the remote headless-browser render service.
pub struct HeadlessRenderAdapter {
    client: Client,
    default_timeout: Duration,
}

impl HeadlessRenderAdapter {
    pub fn new(client: Client, default_timeout: Duration) -> Self {
        Self {
            client,
            default_timeout,
        }
    }
}

#[async_trait]
impl BackendAdapter for HeadlessRenderAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::HeadlessRender
    }

    async fn fetch(&self, url: &str, config: &ProviderConfig) -> Result<RawResponse, BackendError> {
        let timeout = config.timeout(self.default_timeout);
        let endpoint = format!("{}/content", config.base_url());
        debug!("{}: rendering {}", config.provider_name, url);

        let mut request = self.client.post(&endpoint).timeout(timeout).json(&RenderRequest {
            url,
            goto_options: GotoOptions {
                wait_until: "networkidle2",
                timeout: timeout.as_millis() as u64,
            },
        });
        if let Some(token) = &config.api_key {
            request = request.query(&[("token", token)]);
        }

        read_response(&config.provider_name, request.send().await?).await
    }

    fn is_retryable(&self, error: &BackendError) -> bool {
        error.status_in(RETRYABLE_STATUSES)
            || error.is_socket_timeout()
            || error.is_transport_failure()
    }
}
