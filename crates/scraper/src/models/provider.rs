use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::types::ProviderId;

/// The transport family a provider speaks.
///
/// Selected once at configuration time; the adapter registry maps each kind to
/// its [`BackendAdapter`](crate::provider::BackendAdapter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// POST of a JSON job envelope, synchronous JSON answer.
    JsonEnvelope,
    /// Remote headless-browser session that returns the rendered page.
    HeadlessRender,
    /// Single GET with the API key and target URL in the query string.
    GenericScrape,
    /// Job submission followed by long-poll GETs until the result is ready.
    LongPoll,
}

impl BackendKind {
    /// Returns the string representation of this backend kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::JsonEnvelope => "json_envelope",
            BackendKind::HeadlessRender => "headless_render",
            BackendKind::GenericScrape => "generic_scrape",
            BackendKind::LongPoll => "long_poll",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Connection parameters for one provider.
///
/// Read-only from the resilience layer's point of view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub provider_id: ProviderId,

    /// Human-readable name used in logs and notifications
    pub provider_name: String,

    pub backend: BackendKind,

    /// Base URL of the provider's proxy or API endpoint
    pub host: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Per-request timeout override in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ProviderConfig {
    /// Create a config with only the required fields set.
    pub fn new(
        provider_id: ProviderId,
        provider_name: impl Into<String>,
        backend: BackendKind,
        host: impl Into<String>,
    ) -> Self {
        Self {
            provider_id,
            provider_name: provider_name.into(),
            backend,
            host: host.into(),
            username: None,
            password: None,
            api_key: None,
            timeout_secs: None,
        }
    }

    /// Request timeout for this provider, falling back to `default`.
    pub fn timeout(&self, default: Duration) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(default)
    }

    /// Host without a trailing slash, ready for path concatenation.
    pub fn base_url(&self) -> &str {
        self.host.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_serde_names() {
        let json = serde_json::to_string(&BackendKind::HeadlessRender).unwrap();
        assert_eq!(json, "\"headless_render\"");

        let kind: BackendKind = serde_json::from_str("\"long_poll\"").unwrap();
        assert_eq!(kind, BackendKind::LongPoll);
    }

    #[test]
    fn test_provider_config_from_json() {
        let config: ProviderConfig = serde_json::from_str(
            r#"{
                "providerId": 3,
                "providerName": "envelope-us",
                "backend": "json_envelope",
                "host": "https://envelope.example.com/",
                "username": "user",
                "password": "secret"
            }"#,
        )
        .unwrap();

        assert_eq!(config.provider_id, 3);
        assert_eq!(config.backend, BackendKind::JsonEnvelope);
        assert_eq!(config.base_url(), "https://envelope.example.com");
        assert_eq!(config.api_key, None);
        assert_eq!(
            config.timeout(Duration::from_secs(30)),
            Duration::from_secs(30)
        );
    }
}
