//! Collaborator store traits.
//!
//! The resilience layer does not own persistence. These traits describe the
//! operations it needs from the failure-counter, provider-config and
//! cron-binding stores, so any storage engine can sit behind them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::models::{CronBinding, FailureRecord, JobId, ProviderConfig, ProviderId};

// =============================================================================
// Failure Counter Store
// =============================================================================

/// Storage interface for per-provider failure records.
///
/// # Atomicity
///
/// `increment` and `init` must be atomic per provider. Two concurrent failures
/// against the same provider have to end up as two increments, never one.
#[async_trait]
pub trait FailureCounterStore: Send + Sync {
    /// Gets the record for a provider, if one exists.
    async fn get(&self, provider_id: ProviderId) -> Result<Option<FailureRecord>>;

    /// Creates the record for a provider's first failure.
    ///
    /// If a record was created concurrently, it is incremented instead and the
    /// stored record is returned.
    async fn init(&self, record: FailureRecord) -> Result<FailureRecord>;

    /// Atomically increments a provider's failure count and returns the new record.
    ///
    /// A record at zero restarts its window at `now`; otherwise the window is
    /// left untouched. Returns `None` when no record exists.
    async fn increment(
        &self,
        provider_id: ProviderId,
        now: DateTime<Utc>,
    ) -> Result<Option<FailureRecord>>;

    /// Overwrites a provider's failure count, leaving its window untouched.
    ///
    /// Not safe against concurrent failures; the counter itself always uses
    /// `increment`. Fails with `NotFound` when the provider has no record.
    async fn update(&self, provider_id: ProviderId, failure_count: u32) -> Result<FailureRecord>;

    /// Lists every record, for the reset and failover sweeps.
    async fn list_all(&self) -> Result<Vec<FailureRecord>>;

    /// Zeroes a provider's count, stamping the actor.
    ///
    /// Fails with [`ScrapeError::NotFound`](crate::errors::ScrapeError::NotFound)
    /// when the provider has no record.
    async fn reset_one(
        &self,
        provider_id: ProviderId,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<FailureRecord>;
}

// =============================================================================
// Provider Config Store
// =============================================================================

/// Read access to provider connection parameters.
#[async_trait]
pub trait ProviderConfigStore: Send + Sync {
    /// All configurations registered for a provider id. The first is canonical.
    async fn get_by_provider_id(&self, provider_id: ProviderId) -> Result<Vec<ProviderConfig>>;

    /// The canonical configuration for a provider id.
    async fn canonical(&self, provider_id: ProviderId) -> Result<Option<ProviderConfig>> {
        Ok(self.get_by_provider_id(provider_id).await?.into_iter().next())
    }

    /// The provider's display name, if it is configured.
    async fn provider_name(&self, provider_id: ProviderId) -> Result<Option<String>> {
        Ok(self
            .canonical(provider_id)
            .await?
            .map(|config| config.provider_name))
    }
}

// =============================================================================
// Cron Binding Store
// =============================================================================

/// Storage interface for job to provider bindings.
#[async_trait]
pub trait CronBindingStore: Send + Sync {
    /// Every binding whose current provider is `provider_id`.
    async fn get_bindings_by_provider_id(&self, provider_id: ProviderId)
        -> Result<Vec<CronBinding>>;

    /// The binding of a job, looked up by job name.
    async fn get_binding_by_name(&self, job_name: &str) -> Result<Option<CronBinding>>;

    /// Points a job at a new provider and sequence.
    async fn update_binding(
        &self,
        job_id: JobId,
        provider_id: ProviderId,
        sequence: i32,
    ) -> Result<()>;
}
