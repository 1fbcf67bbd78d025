//! Retry orchestration for backend fetches.
//!
//! [`RetryPolicy`] holds the budget, backoff and escalation thresholds as
//! data. [`RetryPolicyExecutor`] drives one adapter through the
//! `Attempting -> Retrying -> Escalating -> Exhausted` states with an explicit
//! attempt counter.

mod executor;
mod policy;

pub use executor::{FailoverEscalation, NoEscalation, RetryPolicyExecutor};
pub use policy::{RetryDecision, RetryPolicy, RetryState, DEFAULT_ESCALATE_AFTER_ATTEMPT};
