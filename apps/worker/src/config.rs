use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use repricer_scraper::config::ResilienceConfig;
use repricer_scraper::WebhookUrls;

pub struct Config {
    pub resilience: ResilienceConfig,
    pub reset_sweep_interval: Duration,
    pub failover_sweep_interval: Duration,
    pub webhooks: WebhookUrls,
    pub cache_invalidation_url: Option<String>,
    /// JSON document seeding providers, bindings and thresholds
    pub seed_file: Option<PathBuf>,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Unset or unparseable
    /// numbers fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = ResilienceConfig::default();
        let text = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let number = |key: &str, default| parse_or(text(key), default);

        let resilience = ResilienceConfig {
            max_retries: number("RP_MAX_RETRIES", defaults.max_retries as u64) as u32,
            retry_interval_ms: number("RP_RETRY_INTERVAL_MS", defaults.retry_interval_ms),
            reset_window_ms: number("RP_RESET_WINDOW_MS", defaults.reset_window_ms),
            default_threshold: number("RP_DEFAULT_THRESHOLD", defaults.default_threshold as u64)
                as u32,
            request_timeout_secs: number("RP_REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            poll_interval_ms: number("RP_POLL_INTERVAL_MS", defaults.poll_interval_ms),
            max_polls: number("RP_MAX_POLLS", defaults.max_polls as u64) as u32,
        };

        Self {
            resilience,
            reset_sweep_interval: Duration::from_secs(number("RP_RESET_SWEEP_INTERVAL_SECS", 300)),
            failover_sweep_interval: Duration::from_secs(number(
                "RP_FAILOVER_SWEEP_INTERVAL_SECS",
                60,
            )),
            webhooks: WebhookUrls {
                provider_changed: text("RP_PROVIDER_CHANGED_WEBHOOK"),
                threshold_exhausted: text("RP_THRESHOLD_EXHAUSTED_WEBHOOK"),
            },
            cache_invalidation_url: text("RP_CACHE_INVALIDATION_URL"),
            seed_file: text("RP_SEED_FILE").map(PathBuf::from),
            log_format: text("RP_LOG_FORMAT").unwrap_or_else(|| "text".to_string()),
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}
