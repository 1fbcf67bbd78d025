//! Per-adapter retry loop.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info, warn};

use crate::counter::FailureCounter;
use crate::errors::{Result, ScrapeError};
use crate::models::{ProviderConfig, ProviderId, ScrapeResult};
use crate::normalize::normalize;
use crate::provider::{BackendAdapter, BackendError};

use super::policy::{RetryPolicy, RetryState};

/// Eager failover hook invoked while a request keeps failing.
///
/// Implemented by the failover orchestrator. Kept as a trait so the executor
/// does not depend on the binding stores.
#[async_trait]
pub trait FailoverEscalation: Send + Sync {
    /// Evaluate a degraded provider now instead of waiting for the sweep.
    async fn escalate(&self, provider_id: ProviderId);
}

/// Escalation that does nothing.
pub struct NoEscalation;

#[async_trait]
impl FailoverEscalation for NoEscalation {
    async fn escalate(&self, _provider_id: ProviderId) {}
}

/// Runs fetches against one adapter under the retry policy.
///
/// Every failed attempt is recorded against the provider. Retryable failures
/// back off linearly; from the third attempt on, the provider is escalated to
/// the orchestrator before sleeping.
pub struct RetryPolicyExecutor {
    adapter: Arc<dyn BackendAdapter>,
    counter: Arc<FailureCounter>,
    escalation: Arc<dyn FailoverEscalation>,
    policy: RetryPolicy,
}

impl RetryPolicyExecutor {
    pub fn new(
        adapter: Arc<dyn BackendAdapter>,
        counter: Arc<FailureCounter>,
        escalation: Arc<dyn FailoverEscalation>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            adapter,
            counter,
            escalation,
            policy,
        }
    }

    pub fn adapter(&self) -> &Arc<dyn BackendAdapter> {
        &self.adapter
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch and normalize `url`, or `None` once the failure is final.
    ///
    /// Failures never propagate past this call; they are logged with the
    /// correlation id.
    pub async fn execute(
        &self,
        url: &str,
        config: &ProviderConfig,
        correlation_id: &str,
    ) -> Option<ScrapeResult> {
        match self.try_execute(url, config, correlation_id).await {
            Ok(result) => Some(result),
            Err(e) => {
                error!("[{}] {} gave up on {}: {}", correlation_id, config.provider_name, url, e);
                None
            }
        }
    }

    /// Same as [`execute`](Self::execute), surfacing why the request failed.
    ///
    /// # Errors
    ///
    /// - `ScrapeError::Permanent` when the last failure was not retryable
    /// - `ScrapeError::RetriesExhausted` when the budget ran out
    pub async fn try_execute(
        &self,
        url: &str,
        config: &ProviderConfig,
        correlation_id: &str,
    ) -> Result<ScrapeResult> {
        let mut attempt: u32 = 0;

        loop {
            debug!(
                "[{}] {:?} {} attempt {}/{} for {}",
                correlation_id,
                RetryState::Attempting,
                config.provider_name,
                attempt + 1,
                self.policy.max_attempts(),
                url
            );

            let failure = match self.fetch_once(url, config).await {
                Ok(result) => {
                    if attempt > 0 {
                        info!(
                            "[{}] {} succeeded on attempt {}",
                            correlation_id,
                            config.provider_name,
                            attempt + 1
                        );
                    }
                    return Ok(result);
                }
                Err(failure) => failure,
            };

            self.record_failure(config, correlation_id).await;

            let class = self.adapter.classify(&failure);
            let error = ScrapeError::backend(&config.provider_name, failure.to_string(), class);
            let decision = self.policy.decide(attempt, class);

            match decision.state {
                RetryState::Exhausted if error.is_transient() => {
                    warn!(
                        "[{}] {} failed after {} attempts, last error: {}",
                        correlation_id,
                        config.provider_name,
                        attempt + 1,
                        error
                    );
                    return Err(ScrapeError::RetriesExhausted {
                        provider: config.provider_name.clone(),
                        attempts: attempt + 1,
                    });
                }
                RetryState::Exhausted => return Err(error),
                RetryState::Escalating => {
                    warn!(
                        "[{}] {} still failing on attempt {}, escalating for failover",
                        correlation_id,
                        config.provider_name,
                        attempt + 1
                    );
                    self.escalation.escalate(config.provider_id).await;
                }
                RetryState::Retrying | RetryState::Attempting => {}
            }

            warn!(
                "[{}] {}, retrying in {:?}",
                correlation_id, error, decision.backoff
            );
            tokio::time::sleep(decision.backoff).await;
            attempt += 1;
        }
    }

    async fn fetch_once(
        &self,
        url: &str,
        config: &ProviderConfig,
    ) -> std::result::Result<ScrapeResult, BackendError> {
        let raw = self.adapter.fetch(url, config).await?;
        normalize(raw).map_err(|e| BackendError::malformed(e.to_string()))
    }

    async fn record_failure(&self, config: &ProviderConfig, correlation_id: &str) {
        if let Err(e) = self.counter.record_failure(config.provider_id).await {
            warn!(
                "[{}] could not record failure for {}: {}",
                correlation_id, config.provider_name, e
            );
        }
    }
}
