//! The two periodic sweeps of the resilience layer.

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::counter::FailureCounter;
use crate::failover::FailoverOrchestrator;

use super::ScheduledTask;

pub const FAILURE_RESET_SWEEP_JOB: &str = "failure-reset-sweep";
pub const FAILOVER_SWEEP_JOB: &str = "failover-sweep";

/// Zeroes failure counters whose window has elapsed.
pub struct FailureResetSweep {
    counter: Arc<FailureCounter>,
    period: Duration,
}

impl FailureResetSweep {
    pub fn new(counter: Arc<FailureCounter>, period: Duration) -> Self {
        Self { counter, period }
    }
}

#[async_trait]
impl ScheduledTask for FailureResetSweep {
    fn name(&self) -> &str {
        FAILURE_RESET_SWEEP_JOB
    }

    fn period(&self) -> Duration {
        self.period
    }

    async fn run(&self) {
        match self.counter.sweep_and_reset_expired(Utc::now()).await {
            Ok(reset) if reset.is_empty() => debug!("Failure reset sweep: nothing expired"),
            Ok(reset) => info!("Failure reset sweep: reset {} provider(s)", reset.len()),
            Err(e) => warn!("Failure reset sweep failed: {}", e),
        }
    }
}

/// Fails over jobs bound to providers over their threshold.
pub struct FailoverSweep {
    orchestrator: Arc<FailoverOrchestrator>,
    period: Duration,
}

impl FailoverSweep {
    pub fn new(orchestrator: Arc<FailoverOrchestrator>, period: Duration) -> Self {
        Self {
            orchestrator,
            period,
        }
    }
}

#[async_trait]
impl ScheduledTask for FailoverSweep {
    fn name(&self) -> &str {
        FAILOVER_SWEEP_JOB
    }

    fn period(&self) -> Duration {
        self.period
    }

    async fn run(&self) {
        match self.orchestrator.sweep().await {
            Ok(outcomes) if outcomes.is_empty() => debug!("Failover sweep: no job moved"),
            Ok(outcomes) => info!("Failover sweep: {} job(s) affected", outcomes.len()),
            Err(e) => warn!("Failover sweep failed: {}", e),
        }
    }
}
