//! In-memory store implementations.
//!
//! Backed by [`DashMap`], whose per-key locking gives the atomic
//! increment-and-return the failure counter needs. State is lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::debug;

use super::traits::{CronBindingStore, FailureCounterStore, ProviderConfigStore};
use crate::errors::{Result, ScrapeError};
use crate::models::{CronBinding, FailureRecord, JobId, ProviderConfig, ProviderId};

// =============================================================================
// Failure records
// =============================================================================

/// Failure counters held in process memory.
#[derive(Default)]
pub struct InMemoryFailureStore {
    records: DashMap<ProviderId, FailureRecord>,
}

impl InMemoryFailureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records.
    pub fn with_records(records: impl IntoIterator<Item = FailureRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.records.insert(record.provider_id, record);
        }
        store
    }
}

#[async_trait]
impl FailureCounterStore for InMemoryFailureStore {
    async fn get(&self, provider_id: ProviderId) -> Result<Option<FailureRecord>> {
        Ok(self.records.get(&provider_id).map(|r| r.value().clone()))
    }

    async fn init(&self, record: FailureRecord) -> Result<FailureRecord> {
        match self.records.entry(record.provider_id) {
            Entry::Occupied(mut existing) => {
                debug!(
                    "Failure record for provider {} already exists, incrementing",
                    record.provider_id
                );
                let next = existing.get().incremented(record.window_start);
                existing.insert(next.clone());
                Ok(next)
            }
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn increment(
        &self,
        provider_id: ProviderId,
        now: DateTime<Utc>,
    ) -> Result<Option<FailureRecord>> {
        match self.records.get_mut(&provider_id) {
            Some(mut record) => {
                let next = record.incremented(now);
                *record = next.clone();
                Ok(Some(next))
            }
            None => Ok(None),
        }
    }

    async fn update(&self, provider_id: ProviderId, failure_count: u32) -> Result<FailureRecord> {
        match self.records.get_mut(&provider_id) {
            Some(mut record) => {
                record.failure_count = failure_count;
                Ok(record.clone())
            }
            None => Err(ScrapeError::NotFound(format!(
                "failure record for provider {}",
                provider_id
            ))),
        }
    }

    async fn list_all(&self) -> Result<Vec<FailureRecord>> {
        let mut records: Vec<_> = self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by_key(|r| r.provider_id);
        Ok(records)
    }

    async fn reset_one(
        &self,
        provider_id: ProviderId,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<FailureRecord> {
        match self.records.get_mut(&provider_id) {
            Some(mut record) => {
                let next = record.reset(actor, now);
                *record = next.clone();
                Ok(next)
            }
            None => Err(ScrapeError::NotFound(format!(
                "failure record for provider {}",
                provider_id
            ))),
        }
    }
}

// =============================================================================
// Provider configs
// =============================================================================

/// Provider configurations held in process memory.
#[derive(Default)]
pub struct InMemoryProviderStore {
    configs: DashMap<ProviderId, Vec<ProviderConfig>>,
}

impl InMemoryProviderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_configs(configs: impl IntoIterator<Item = ProviderConfig>) -> Self {
        let store = Self::new();
        for config in configs {
            store.insert(config);
        }
        store
    }

    /// Adds a configuration; the first one added for an id stays canonical.
    pub fn insert(&self, config: ProviderConfig) {
        self.configs
            .entry(config.provider_id)
            .or_default()
            .push(config);
    }
}

#[async_trait]
impl ProviderConfigStore for InMemoryProviderStore {
    async fn get_by_provider_id(&self, provider_id: ProviderId) -> Result<Vec<ProviderConfig>> {
        Ok(self
            .configs
            .get(&provider_id)
            .map(|c| c.value().clone())
            .unwrap_or_default())
    }
}

// =============================================================================
// Cron bindings
// =============================================================================

/// Job bindings held in process memory.
#[derive(Default)]
pub struct InMemoryBindingStore {
    bindings: DashMap<JobId, CronBinding>,
}

impl InMemoryBindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bindings(bindings: impl IntoIterator<Item = CronBinding>) -> Self {
        let store = Self::new();
        for binding in bindings {
            store.bindings.insert(binding.job_id, binding);
        }
        store
    }

    /// Snapshot of a binding by job id.
    pub fn binding(&self, job_id: JobId) -> Option<CronBinding> {
        self.bindings.get(&job_id).map(|b| b.value().clone())
    }
}

#[async_trait]
impl CronBindingStore for InMemoryBindingStore {
    async fn get_bindings_by_provider_id(
        &self,
        provider_id: ProviderId,
    ) -> Result<Vec<CronBinding>> {
        let mut bindings: Vec<_> = self
            .bindings
            .iter()
            .filter(|b| b.current_provider_id == provider_id)
            .map(|b| b.value().clone())
            .collect();
        bindings.sort_by_key(|b| b.job_id);
        Ok(bindings)
    }

    async fn get_binding_by_name(&self, job_name: &str) -> Result<Option<CronBinding>> {
        Ok(self
            .bindings
            .iter()
            .find(|b| b.job_name == job_name)
            .map(|b| b.value().clone()))
    }

    async fn update_binding(
        &self,
        job_id: JobId,
        provider_id: ProviderId,
        sequence: i32,
    ) -> Result<()> {
        match self.bindings.get_mut(&job_id) {
            Some(mut binding) => {
                binding.current_provider_id = provider_id;
                binding.current_sequence = sequence;
                Ok(())
            }
            None => Err(ScrapeError::NotFound(format!("binding for job {}", job_id))),
        }
    }
}
