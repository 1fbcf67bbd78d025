//! Scrape entry point and wiring of the resilience layer.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::config::ResilienceConfig;
use crate::counter::{FailureCounter, FailureCounterConfig};
use crate::errors::{Result, ScrapeError};
use crate::failover::FailoverOrchestrator;
use crate::models::{BackendKind, ProviderId, ScrapeResult};
use crate::notify::{CacheInvalidator, NotificationDispatcher};
use crate::provider::AdapterRegistry;
use crate::retry::{FailoverEscalation, RetryPolicy, RetryPolicyExecutor};
use crate::store::{CronBindingStore, FailureCounterStore, ProviderConfigStore};

/// Resolves a provider's configuration and runs the matching executor.
///
/// One [`RetryPolicyExecutor`] exists per registered backend kind.
pub struct ScrapeService {
    providers: Arc<dyn ProviderConfigStore>,
    bindings: Arc<dyn CronBindingStore>,
    executors: HashMap<BackendKind, RetryPolicyExecutor>,
}

impl ScrapeService {
    pub fn new(
        registry: &AdapterRegistry,
        counter: Arc<FailureCounter>,
        escalation: Arc<dyn FailoverEscalation>,
        policy: RetryPolicy,
        providers: Arc<dyn ProviderConfigStore>,
        bindings: Arc<dyn CronBindingStore>,
    ) -> Self {
        let executors = registry
            .adapters()
            .map(|adapter| {
                (
                    adapter.kind(),
                    RetryPolicyExecutor::new(
                        adapter.clone(),
                        counter.clone(),
                        escalation.clone(),
                        policy.clone(),
                    ),
                )
            })
            .collect();

        Self {
            providers,
            bindings,
            executors,
        }
    }

    /// The executor bound to a backend kind.
    pub fn executor(&self, kind: BackendKind) -> Option<&RetryPolicyExecutor> {
        self.executors.get(&kind)
    }

    /// Scrape `url` through a provider.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when every attempt failed; the failures are already logged
    /// and counted.
    ///
    /// # Errors
    ///
    /// `ScrapeError::Configuration` when the provider has no configuration or
    /// its backend has no adapter.
    pub async fn scrape(
        &self,
        url: &str,
        provider_id: ProviderId,
        correlation_id: &str,
    ) -> Result<Option<ScrapeResult>> {
        let config = self
            .providers
            .canonical(provider_id)
            .await?
            .ok_or(ScrapeError::Configuration(provider_id))?;

        let executor = self
            .executors
            .get(&config.backend)
            .ok_or(ScrapeError::Configuration(provider_id))?;

        debug!(
            "[{}] scraping {} via '{}' ({})",
            correlation_id, url, config.provider_name, config.backend
        );
        Ok(executor.execute(url, &config, correlation_id).await)
    }

    /// Scrape `url` through whichever provider a job is currently bound to.
    pub async fn scrape_for_job(
        &self,
        job_name: &str,
        url: &str,
        correlation_id: &str,
    ) -> Result<Option<ScrapeResult>> {
        let binding = self
            .bindings
            .get_binding_by_name(job_name)
            .await?
            .ok_or_else(|| ScrapeError::NotFound(format!("job '{}'", job_name)))?;

        self.scrape(url, binding.current_provider_id, correlation_id)
            .await
    }
}

/// The stores the resilience layer reads and writes.
#[derive(Clone)]
pub struct StoreHandles {
    pub failures: Arc<dyn FailureCounterStore>,
    pub providers: Arc<dyn ProviderConfigStore>,
    pub bindings: Arc<dyn CronBindingStore>,
}

/// Counter, orchestrator and scrape service wired together.
#[derive(Clone)]
pub struct ResilienceStack {
    pub counter: Arc<FailureCounter>,
    pub orchestrator: Arc<FailoverOrchestrator>,
    pub service: Arc<ScrapeService>,
}

impl ResilienceStack {
    pub fn build(
        stores: StoreHandles,
        registry: &AdapterRegistry,
        dispatcher: Arc<NotificationDispatcher>,
        cache: Arc<dyn CacheInvalidator>,
        config: &ResilienceConfig,
    ) -> Self {
        let counter = Arc::new(FailureCounter::new(
            stores.failures.clone(),
            stores.providers.clone(),
            FailureCounterConfig::from(config),
        ));

        let orchestrator = Arc::new(FailoverOrchestrator::new(
            stores.failures,
            stores.bindings.clone(),
            stores.providers.clone(),
            dispatcher,
            cache,
        ));

        let service = Arc::new(ScrapeService::new(
            registry,
            counter.clone(),
            orchestrator.clone(),
            config.retry_policy(),
            stores.providers,
            stores.bindings,
        ));

        Self {
            counter,
            orchestrator,
            service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CronBinding, ProviderConfig};
    use crate::notify::{LogSink, NoopCacheInvalidator};
    use crate::store::{InMemoryBindingStore, InMemoryFailureStore, InMemoryProviderStore};
    use mockito::Matcher;
    use reqwest::Client;

    fn stack(host: String) -> ResilienceStack {
        let mut config = ProviderConfig::new(3, "generic-1", BackendKind::GenericScrape, host);
        config.api_key = Some("k".to_string());

        let stores = StoreHandles {
            failures: Arc::new(InMemoryFailureStore::new()),
            providers: Arc::new(InMemoryProviderStore::with_configs([config])),
            bindings: Arc::new(InMemoryBindingStore::with_bindings([CronBinding {
                job_id: 1,
                job_name: "nightly-catalog".to_string(),
                current_provider_id: 3,
                current_sequence: 0,
                alternates: Vec::new(),
            }])),
        };
        let resilience = ResilienceConfig {
            max_retries: 0,
            ..ResilienceConfig::default()
        };

        ResilienceStack::build(
            stores,
            &AdapterRegistry::with_defaults(Client::new(), &resilience),
            Arc::new(NotificationDispatcher::new(Arc::new(LogSink))),
            Arc::new(NoopCacheInvalidator),
            &resilience,
        )
    }

    #[test]
    fn test_one_executor_per_backend() {
        let stack = stack("https://unused.example.com".to_string());
        for kind in [
            BackendKind::JsonEnvelope,
            BackendKind::HeadlessRender,
            BackendKind::GenericScrape,
            BackendKind::LongPoll,
        ] {
            assert_eq!(stack.service.executor(kind).unwrap().adapter().kind(), kind);
        }
    }

    #[tokio::test]
    async fn test_unknown_provider_is_configuration_error() {
        let stack = stack("https://unused.example.com".to_string());
        let err = stack
            .service
            .scrape("https://shop.example.com/1", 404, "req-1")
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Configuration(404)));
    }

    #[tokio::test]
    async fn test_scrape_for_job_uses_bound_provider() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_query(Matcher::UrlEncoded(
                "url".into(),
                "https://shop.example.com/1".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"price":"9.99"}"#)
            .create_async()
            .await;

        let stack = stack(server.url());
        let result = stack
            .service
            .scrape_for_job("nightly-catalog", "https://shop.example.com/1", "req-2")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            result,
            Some(ScrapeResult::Json(serde_json::json!({ "price": "9.99" })))
        );
    }

    #[tokio::test]
    async fn test_failed_scrape_returns_none_and_counts() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let stack = stack(server.url());
        let result = stack
            .service
            .scrape("https://shop.example.com/1", 3, "req-3")
            .await
            .unwrap();

        assert!(result.is_none());
        let record = stack.counter.record(3).await.unwrap().unwrap();
        assert_eq!(record.failure_count, 1);
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let stack = stack("https://unused.example.com".to_string());
        let err = stack
            .service
            .scrape_for_job("missing", "https://shop.example.com/1", "req-4")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
