//! Seeding the in-memory stores from a JSON document.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use super::memory::{InMemoryBindingStore, InMemoryFailureStore, InMemoryProviderStore};
use crate::errors::Result;
use crate::models::{CronBinding, FailureRecord, ProviderConfig, ProviderId};

/// Per-provider threshold declared up front.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdSeed {
    pub provider_id: ProviderId,
    pub threshold_count: u32,
}

/// Initial contents of the stores.
///
/// ```json
/// {
///   "providers": [{ "providerId": 1, "providerName": "envelope-us",
///                   "backend": "json_envelope", "host": "https://..." }],
///   "bindings": [{ "jobId": 1, "jobName": "nightly", "currentProviderId": 1,
///                  "currentSequence": 0,
///                  "alternates": [{ "providerId": 1, "sequence": 0 }] }],
///   "thresholds": [{ "providerId": 1, "thresholdCount": 10 }]
/// }
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    #[serde(default)]
    pub bindings: Vec<CronBinding>,
    #[serde(default)]
    pub thresholds: Vec<ThresholdSeed>,
}

/// The three in-memory stores, ready to be shared.
#[derive(Clone)]
pub struct MemoryStores {
    pub failures: Arc<InMemoryFailureStore>,
    pub providers: Arc<InMemoryProviderStore>,
    pub bindings: Arc<InMemoryBindingStore>,
}

impl SeedData {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds the stores. Declared thresholds become zeroed failure records.
    pub fn into_stores(self, now: DateTime<Utc>) -> MemoryStores {
        let records: Vec<FailureRecord> = self
            .thresholds
            .iter()
            .map(|seed| {
                let provider_name = self
                    .providers
                    .iter()
                    .find(|p| p.provider_id == seed.provider_id)
                    .map(|p| p.provider_name.clone())
                    .unwrap_or_else(|| format!("provider-{}", seed.provider_id));
                FailureRecord {
                    failure_count: 0,
                    ..FailureRecord::first_failure(
                        seed.provider_id,
                        provider_name,
                        seed.threshold_count,
                        now,
                    )
                }
            })
            .collect();

        MemoryStores {
            failures: Arc::new(InMemoryFailureStore::with_records(records)),
            providers: Arc::new(InMemoryProviderStore::with_configs(self.providers)),
            bindings: Arc::new(InMemoryBindingStore::with_bindings(self.bindings)),
        }
    }
}
