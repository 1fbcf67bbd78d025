//! Moves jobs off degraded providers.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, info, warn};
use tokio::sync::Mutex;

use crate::errors::Result;
use crate::models::{CronBinding, JobId, ProviderId, SwitchOutcome, Transition};
use crate::notify::{CacheInvalidator, NotificationDispatcher};
use crate::retry::FailoverEscalation;
use crate::store::{CronBindingStore, FailureCounterStore, ProviderConfigStore};

use super::transition::plan_transition;

/// Evaluates failure counters against thresholds and advances the jobs bound
/// to a degraded provider along their alternate chains.
///
/// # Concurrency
///
/// Advances on the same job are serialized by a per-job lock, so the failover
/// sweep and an eager escalation cannot both move a job one step from the
/// same starting point. Advances on different jobs never contend.
pub struct FailoverOrchestrator {
    counters: Arc<dyn FailureCounterStore>,
    bindings: Arc<dyn CronBindingStore>,
    providers: Arc<dyn ProviderConfigStore>,
    dispatcher: Arc<NotificationDispatcher>,
    cache: Arc<dyn CacheInvalidator>,
    job_locks: DashMap<JobId, Arc<Mutex<()>>>,
}

impl FailoverOrchestrator {
    pub fn new(
        counters: Arc<dyn FailureCounterStore>,
        bindings: Arc<dyn CronBindingStore>,
        providers: Arc<dyn ProviderConfigStore>,
        dispatcher: Arc<NotificationDispatcher>,
        cache: Arc<dyn CacheInvalidator>,
    ) -> Self {
        Self {
            counters,
            bindings,
            providers,
            dispatcher,
            cache,
            job_locks: DashMap::new(),
        }
    }

    /// Fail over every job bound to `provider_id` if the provider is over its
    /// threshold, then notify.
    ///
    /// A provider at or under its threshold is a no-op and touches no binding.
    /// A job whose advance fails is logged and skipped; the others proceed.
    pub async fn evaluate(&self, provider_id: ProviderId) -> Result<Vec<SwitchOutcome>> {
        let outcomes = self.fail_over(provider_id).await?;
        self.dispatcher.dispatch(&outcomes).await;
        Ok(outcomes)
    }

    /// Advance the jobs bound to an over-threshold provider without notifying.
    async fn fail_over(&self, provider_id: ProviderId) -> Result<Vec<SwitchOutcome>> {
        let Some(record) = self.counters.get(provider_id).await? else {
            debug!("Failover: no failure record for provider {}", provider_id);
            return Ok(Vec::new());
        };
        if !record.is_over_threshold() {
            debug!(
                "Failover: '{}' at {}/{}, nothing to do",
                record.provider_name, record.failure_count, record.threshold_count
            );
            return Ok(Vec::new());
        }

        let bindings = self.bindings.get_bindings_by_provider_id(provider_id).await?;
        info!(
            "Failover: '{}' over threshold ({}/{}), {} job(s) bound",
            record.provider_name,
            record.failure_count,
            record.threshold_count,
            bindings.len()
        );

        let mut outcomes = Vec::with_capacity(bindings.len());
        for binding in bindings {
            match self.advance_if_bound(&binding, provider_id).await {
                Ok(Some(outcome)) => outcomes.push(outcome),
                Ok(None) => {}
                Err(e) => warn!("Failover: could not advance '{}': {}", binding.job_name, e),
            }
        }

        Ok(outcomes)
    }

    /// Move a job one step along its alternate chain.
    ///
    /// Persists the new binding, signals the downstream cache and reports what
    /// happened. Does not notify.
    pub async fn advance(&self, binding: &CronBinding) -> Result<SwitchOutcome> {
        let lock = self.job_lock(binding.job_id);
        let _guard = lock.lock().await;
        self.advance_locked(binding).await
    }

    /// Operator-triggered [`advance`](Self::advance) for a single job.
    ///
    /// Returns `None` when the job has no alternates configured.
    pub async fn manual_evaluate(&self, binding: &CronBinding) -> Result<Option<SwitchOutcome>> {
        if !binding.has_alternates() {
            info!("Failover: '{}' has no alternates configured", binding.job_name);
            return Ok(None);
        }
        self.advance(binding).await.map(Some)
    }

    /// Evaluate every provider with a failure record.
    pub async fn sweep(&self) -> Result<Vec<SwitchOutcome>> {
        let mut outcomes = Vec::new();

        for record in self.counters.list_all().await? {
            if !record.is_over_threshold() {
                continue;
            }
            match self.evaluate(record.provider_id).await {
                Ok(mut batch) => outcomes.append(&mut batch),
                Err(e) => warn!(
                    "Failover sweep: evaluation of '{}' failed: {}",
                    record.provider_name, e
                ),
            }
        }

        Ok(outcomes)
    }

    /// Advance `binding` only if it still points at `provider_id`.
    ///
    /// The binding is re-read under the job lock; a job that another advance
    /// already moved, or that is exhausted, is left alone.
    async fn advance_if_bound(
        &self,
        binding: &CronBinding,
        provider_id: ProviderId,
    ) -> Result<Option<SwitchOutcome>> {
        let lock = self.job_lock(binding.job_id);
        let _guard = lock.lock().await;

        let Some(current) = self.bindings.get_binding_by_name(&binding.job_name).await? else {
            debug!("Failover: '{}' disappeared, skipping", binding.job_name);
            return Ok(None);
        };
        if current.current_provider_id != provider_id {
            debug!(
                "Failover: '{}' already moved to provider {}",
                current.job_name, current.current_provider_id
            );
            return Ok(None);
        }
        if current.is_exhausted() {
            debug!("Failover: '{}' already exhausted", current.job_name);
            return Ok(None);
        }

        self.advance_locked(&current).await.map(Some)
    }

    async fn advance_locked(&self, binding: &CronBinding) -> Result<SwitchOutcome> {
        let transition = plan_transition(binding);
        let next = binding.apply(transition);

        self.bindings
            .update_binding(next.job_id, next.current_provider_id, next.current_sequence)
            .await?;

        let previous_name = self.provider_name(binding.current_provider_id).await;
        let outcome = match transition {
            Transition::Switch { provider_id, .. } => {
                let new_name = self.provider_name(provider_id).await;
                info!(
                    "Failover: '{}' moved from '{}' to '{}' (sequence {})",
                    binding.job_name, previous_name, new_name, next.current_sequence
                );
                SwitchOutcome::changed(binding.job_id, &binding.job_name, previous_name, new_name)
            }
            Transition::Exhausted => {
                warn!(
                    "Failover: '{}' has no alternate left after '{}'",
                    binding.job_name, previous_name
                );
                SwitchOutcome::exhausted(binding.job_id, &binding.job_name, previous_name)
            }
        };

        self.cache.invalidate(&next);
        Ok(outcome)
    }

    async fn provider_name(&self, provider_id: ProviderId) -> String {
        match self.providers.provider_name(provider_id).await {
            Ok(Some(name)) => name,
            Ok(None) => format!("provider-{}", provider_id),
            Err(e) => {
                warn!("Failover: name lookup for provider {} failed: {}", provider_id, e);
                format!("provider-{}", provider_id)
            }
        }
    }

    fn job_lock(&self, job_id: JobId) -> Arc<Mutex<()>> {
        self.job_locks.entry(job_id).or_default().clone()
    }
}

#[async_trait]
impl FailoverEscalation for FailoverOrchestrator {
    /// Bindings are persisted before this returns. The notification batch is
    /// sent from a background task.
    async fn escalate(&self, provider_id: ProviderId) {
        match self.fail_over(provider_id).await {
            Ok(outcomes) if outcomes.is_empty() => {}
            Ok(outcomes) => {
                let dispatcher = self.dispatcher.clone();
                tokio::spawn(async move {
                    dispatcher.dispatch(&outcomes).await;
                });
            }
            Err(e) => warn!("Failover: eager evaluation of provider {} failed: {}", provider_id, e),
        }
    }
}
