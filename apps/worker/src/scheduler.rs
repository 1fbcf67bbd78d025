//! Background sweeps for the worker.
//!
//! Registers the failure-window reset and the failover evaluation in the job
//! registry and starts them.

use std::sync::Arc;

use repricer_scraper::{FailoverSweep, FailureResetSweep};
use tracing::info;

use crate::main_lib::AppState;

/// Registers and starts both periodic sweeps.
pub fn start_sweeps(state: &Arc<AppState>) -> anyhow::Result<()> {
    let reset = FailureResetSweep::new(
        state.resilience.counter.clone(),
        state.reset_sweep_interval,
    );
    let failover = FailoverSweep::new(
        state.resilience.orchestrator.clone(),
        state.failover_sweep_interval,
    );

    state.jobs.register(Arc::new(reset));
    state.jobs.register(Arc::new(failover));

    for name in state.jobs.names() {
        state.jobs.start(&name)?;
    }

    info!(
        "Sweeps started: failure reset every {:?}, failover every {:?}",
        state.reset_sweep_interval, state.failover_sweep_interval
    );
    Ok(())
}
