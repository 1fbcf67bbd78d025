//! Per-provider failure accounting with a time-windowed reset.
//!
//! Every failed fetch increments its provider's counter. Counters decay
//! passively: a scheduled sweep zeroes any counter whose window has been open
//! longer than the configured reset window. Operators can also zero a single
//! counter by hand.
//!
//! Unlike a circuit breaker, the counter never blocks requests itself. Crossing
//! the threshold is acted upon by the failover orchestrator.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::config::ResilienceConfig;
use crate::errors::Result;
use crate::models::{FailureRecord, ProviderId};
use crate::store::{FailureCounterStore, ProviderConfigStore};

/// Actor stamped on resets performed by the scheduled sweep.
pub const SYSTEM_ACTOR: &str = "SYSTEM";

/// Failure counter configuration.
#[derive(Clone, Debug)]
pub struct FailureCounterConfig {
    /// How long a window stays open before the sweep zeroes its counter.
    pub reset_window: Duration,
    /// Threshold assigned to a provider's record when it is first created.
    pub default_threshold: u32,
}

impl From<&ResilienceConfig> for FailureCounterConfig {
    fn from(config: &ResilienceConfig) -> Self {
        Self {
            reset_window: config.reset_window(),
            default_threshold: config.default_threshold,
        }
    }
}

impl Default for FailureCounterConfig {
    fn default() -> Self {
        Self::from(&ResilienceConfig::default())
    }
}

/// Increments and resets provider failure counts.
pub struct FailureCounter {
    store: Arc<dyn FailureCounterStore>,
    providers: Arc<dyn ProviderConfigStore>,
    config: FailureCounterConfig,
}

impl FailureCounter {
    pub fn new(
        store: Arc<dyn FailureCounterStore>,
        providers: Arc<dyn ProviderConfigStore>,
        config: FailureCounterConfig,
    ) -> Self {
        Self {
            store,
            providers,
            config,
        }
    }

    /// Record a failed request against a provider.
    pub async fn record_failure(&self, provider_id: ProviderId) -> Result<FailureRecord> {
        self.record_failure_at(provider_id, Utc::now()).await
    }

    /// Record a failed request against a provider at a given time.
    ///
    /// The store increments atomically. A provider without a record gets one
    /// initialized to 1 with a fresh window.
    pub async fn record_failure_at(
        &self,
        provider_id: ProviderId,
        now: DateTime<Utc>,
    ) -> Result<FailureRecord> {
        if let Some(record) = self.store.increment(provider_id, now).await? {
            debug!(
                "Failure counter: provider {} at {}/{}",
                provider_id, record.failure_count, record.threshold_count
            );
            return Ok(record);
        }

        let provider_name = match self.providers.provider_name(provider_id).await {
            Ok(Some(name)) => name,
            Ok(None) => format!("provider-{}", provider_id),
            Err(e) => {
                warn!(
                    "Failure counter: name lookup for provider {} failed: {}",
                    provider_id, e
                );
                format!("provider-{}", provider_id)
            }
        };

        let record = self
            .store
            .init(FailureRecord::first_failure(
                provider_id,
                provider_name,
                self.config.default_threshold,
                now,
            ))
            .await?;

        info!(
            "Failure counter: first failure recorded for '{}' (threshold {})",
            record.provider_name, record.threshold_count
        );
        Ok(record)
    }

    /// Zero every counter whose window has elapsed.
    ///
    /// Records at zero, and records whose window is still open, are left alone.
    /// Returns the providers that were reset.
    pub async fn sweep_and_reset_expired(&self, now: DateTime<Utc>) -> Result<Vec<ProviderId>> {
        let mut reset = Vec::new();

        for record in self.store.list_all().await? {
            if record.failure_count == 0 {
                continue;
            }
            if !record.window_elapsed(now, self.config.reset_window) {
                continue;
            }

            match self
                .store
                .reset_one(record.provider_id, SYSTEM_ACTOR, now)
                .await
            {
                Ok(_) => {
                    info!(
                        "Failure counter: window elapsed for '{}', reset from {}",
                        record.provider_name, record.failure_count
                    );
                    reset.push(record.provider_id);
                }
                Err(e) => {
                    warn!(
                        "Failure counter: could not reset '{}': {}",
                        record.provider_name, e
                    );
                }
            }
        }

        Ok(reset)
    }

    /// Zero a provider's counter regardless of elapsed time.
    pub async fn force_reset(&self, provider_id: ProviderId, actor_id: &str) -> Result<FailureRecord> {
        let record = self.store.reset_one(provider_id, actor_id, Utc::now()).await?;
        info!(
            "Failure counter: '{}' manually reset by {}",
            record.provider_name, actor_id
        );
        Ok(record)
    }

    /// The current record for a provider.
    pub async fn record(&self, provider_id: ProviderId) -> Result<Option<FailureRecord>> {
        self.store.get(provider_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BackendKind, ProviderConfig};
    use crate::store::{InMemoryFailureStore, InMemoryProviderStore};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap()
    }

    fn record(provider_id: ProviderId, count: u32, window_start: DateTime<Utc>) -> FailureRecord {
        FailureRecord {
            failure_count: count,
            ..FailureRecord::first_failure(provider_id, format!("p{}", provider_id), 10, window_start)
        }
    }

    fn counter(store: Arc<InMemoryFailureStore>) -> FailureCounter {
        let providers = Arc::new(InMemoryProviderStore::with_configs([ProviderConfig::new(
            1,
            "envelope-us",
            BackendKind::JsonEnvelope,
            "https://envelope.example.com",
        )]));
        FailureCounter::new(
            store,
            providers,
            FailureCounterConfig {
                reset_window: Duration::from_millis(3_600_000),
                default_threshold: 10,
            },
        )
    }

    #[tokio::test]
    async fn test_first_failure_initializes_to_one() {
        let store = Arc::new(InMemoryFailureStore::new());
        let counter = counter(store.clone());

        let record = counter.record_failure_at(1, now()).await.unwrap();

        assert_eq!(record.failure_count, 1);
        assert_eq!(record.threshold_count, 10);
        assert_eq!(record.provider_name, "envelope-us");
        assert_eq!(record.window_start, now());
    }

    struct UnavailableProviderStore;

    #[async_trait::async_trait]
    impl ProviderConfigStore for UnavailableProviderStore {
        async fn get_by_provider_id(&self, _provider_id: ProviderId) -> Result<Vec<ProviderConfig>> {
            Err(crate::errors::ScrapeError::Store("provider table unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_first_failure_counted_when_provider_lookup_fails() {
        let store = Arc::new(InMemoryFailureStore::new());
        let counter = FailureCounter::new(
            store.clone(),
            Arc::new(UnavailableProviderStore),
            FailureCounterConfig::default(),
        );

        let record = counter.record_failure_at(4, now()).await.unwrap();

        assert_eq!(record.failure_count, 1);
        assert_eq!(record.provider_name, "provider-4");
        assert_eq!(store.get(4).await.unwrap().unwrap().failure_count, 1);
    }

    #[tokio::test]
    async fn test_increment_leaves_window_untouched() {
        let start = now() - chrono::Duration::minutes(10);
        let store = Arc::new(InMemoryFailureStore::with_records([record(1, 3, start)]));
        let counter = counter(store.clone());

        let record = counter.record_failure_at(1, now()).await.unwrap();

        assert_eq!(record.failure_count, 4);
        assert_eq!(record.window_start, start);
    }

    #[tokio::test]
    async fn test_failure_after_reset_starts_new_window() {
        let start = now() - chrono::Duration::hours(3);
        let store = Arc::new(InMemoryFailureStore::with_records([record(1, 0, start)]));
        let counter = counter(store.clone());

        let record = counter.record_failure_at(1, now()).await.unwrap();

        assert_eq!(record.failure_count, 1);
        assert_eq!(record.window_start, now());
    }

    #[tokio::test]
    async fn test_unknown_provider_gets_placeholder_name() {
        let store = Arc::new(InMemoryFailureStore::new());
        let counter = counter(store);

        let record = counter.record_failure_at(77, now()).await.unwrap();
        assert_eq!(record.provider_name, "provider-77");
        assert_eq!(record.failure_count, 1);
    }

    #[tokio::test]
    async fn test_sweep_resets_only_elapsed_nonzero_records() {
        let elapsed = now() - chrono::Duration::milliseconds(3_600_001);
        let fresh = now() - chrono::Duration::minutes(5);
        let store = Arc::new(InMemoryFailureStore::with_records([
            record(1, 5, elapsed),
            record(2, 0, elapsed),
            record(3, 8, fresh),
        ]));
        let counter = counter(store.clone());

        let reset = counter.sweep_and_reset_expired(now()).await.unwrap();
        assert_eq!(reset, vec![1]);

        let one = store.get(1).await.unwrap().unwrap();
        assert_eq!(one.failure_count, 0);
        assert_eq!(one.last_reset_by.as_deref(), Some(SYSTEM_ACTOR));

        let two = store.get(2).await.unwrap().unwrap();
        assert_eq!(two.window_start, elapsed);
        assert_eq!(two.last_reset_by, None);

        assert_eq!(store.get(3).await.unwrap().unwrap().failure_count, 8);
    }

    #[tokio::test]
    async fn test_force_reset_ignores_window() {
        let store = Arc::new(InMemoryFailureStore::with_records([record(1, 12, now())]));
        let counter = counter(store.clone());

        let record = counter.force_reset(1, "operator-42").await.unwrap();
        assert_eq!(record.failure_count, 0);
        assert_eq!(record.last_reset_by.as_deref(), Some("operator-42"));
    }

    #[tokio::test]
    async fn test_force_reset_unknown_provider_is_not_found() {
        let counter = counter(Arc::new(InMemoryFailureStore::new()));
        let err = counter.force_reset(404, "operator-42").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
