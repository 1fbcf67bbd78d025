use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

use repricer_scraper::{
    AdapterRegistry, CacheInvalidator, HttpCacheInvalidator, JobRegistry, LogSink, MemoryStores,
    NoopCacheInvalidator, NotificationDispatcher, NotificationSink, ResilienceStack, SeedData,
    StoreHandles, WebhookSink,
};

use crate::config::Config;

pub struct AppState {
    pub instance_id: Uuid,
    pub stores: MemoryStores,
    pub resilience: ResilienceStack,
    pub jobs: Arc<JobRegistry>,
    pub reset_sweep_interval: std::time::Duration,
    pub failover_sweep_interval: std::time::Duration,
}

/// Install the global subscriber. Library `log` records are captured too.
pub fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

async fn load_seed(config: &Config) -> anyhow::Result<SeedData> {
    let Some(path) = &config.seed_file else {
        tracing::warn!("RP_SEED_FILE not set, starting with empty stores");
        return Ok(SeedData::default());
    };

    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading seed file {}", path.display()))?;
    let seed = SeedData::from_json(&json)
        .with_context(|| format!("parsing seed file {}", path.display()))?;

    tracing::info!(
        "Seed loaded from {}: {} provider(s), {} job(s), {} threshold(s)",
        path.display(),
        seed.providers.len(),
        seed.bindings.len(),
        seed.thresholds.len()
    );
    Ok(seed)
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let stores = load_seed(config).await?.into_stores(Utc::now());

    let client = reqwest::Client::builder()
        .timeout(config.resilience.request_timeout())
        .build()
        .context("building HTTP client")?;

    let registry = AdapterRegistry::with_defaults(client.clone(), &config.resilience);
    tracing::info!("{} backend adapter(s) registered", registry.len());

    let sink: Arc<dyn NotificationSink> = if config.webhooks.provider_changed.is_some()
        || config.webhooks.threshold_exhausted.is_some()
    {
        Arc::new(WebhookSink::new(client.clone(), config.webhooks.clone()))
    } else {
        tracing::warn!("No notification webhooks configured, outcomes will only be logged");
        Arc::new(LogSink)
    };

    let cache: Arc<dyn CacheInvalidator> = match &config.cache_invalidation_url {
        Some(url) => Arc::new(HttpCacheInvalidator::new(client, url.clone())),
        None => Arc::new(NoopCacheInvalidator),
    };

    let resilience = ResilienceStack::build(
        StoreHandles {
            failures: stores.failures.clone(),
            providers: stores.providers.clone(),
            bindings: stores.bindings.clone(),
        },
        &registry,
        Arc::new(NotificationDispatcher::new(sink)),
        cache,
        &config.resilience,
    );

    Ok(Arc::new(AppState {
        instance_id: Uuid::now_v7(),
        stores,
        resilience,
        jobs: Arc::new(JobRegistry::new()),
        reset_sweep_interval: config.reset_sweep_interval,
        failover_sweep_interval: config.failover_sweep_interval,
    }))
}
