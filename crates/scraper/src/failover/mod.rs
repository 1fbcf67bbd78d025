//! Provider failover for scheduled jobs.
//!
//! [`plan_transition`] computes the next step of a job's alternate chain as a
//! pure function. [`FailoverOrchestrator`] applies it to every job bound to a
//! provider whose failure count is over its threshold.

mod orchestrator;
mod transition;

pub use orchestrator::FailoverOrchestrator;
pub use transition::plan_transition;
