//! Scraper models
//!
//! This module contains the core data types of the resilience layer:
//! - `types` - Type aliases for common identifiers (ProviderId, JobId)
//! - `provider` - Provider connection parameters (ProviderConfig) and BackendKind
//! - `failure` - Per-provider failure accounting (FailureRecord)
//! - `binding` - Job to provider bindings and alternate chains (CronBinding)
//! - `outcome` - Failover results fed to notifications (SwitchOutcome)
//! - `response` - Raw backend responses and canonical scrape results

mod binding;
mod failure;
mod outcome;
mod provider;
mod response;
mod types;

pub use binding::{AlternateEntry, CronBinding, Transition, EXHAUSTED_SEQUENCE};
pub use failure::FailureRecord;
pub use outcome::SwitchOutcome;
pub use provider::{BackendKind, ProviderConfig};
pub use response::{CanonicalItem, RawResponse, ScrapeResult};
pub use types::{JobId, ProviderId};
