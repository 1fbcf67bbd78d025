//! Repricer Scraper Crate
//!
//! This crate provides the resilience layer in front of the third-party
//! scraping backends used by the repricer.
//!
//! # Overview
//!
//! The scraper crate supports:
//! - Multiple backend families: JSON envelope, headless render, generic
//!   scrape and long-poll job APIs
//! - Per-backend retry predicates with linear backoff
//! - Per-provider failure counting with a time-windowed reset
//! - Automatic failover of scheduled jobs along their alternate chains
//! - Webhook notification and cache invalidation after a failover
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |  ScrapeService   |  (provider id -> config -> executor)
//! +------------------+
//!          |
//!          v
//! +---------------------+      +------------------+
//! | RetryPolicyExecutor | ---> |  FailureCounter  |  (every failed attempt)
//! +---------------------+      +------------------+
//!          |        \
//!          |         \ third attempt and later
//!          v          v
//! +----------------+  +----------------------+      +------------------------+
//! | BackendAdapter |  | FailoverOrchestrator | ---> | NotificationDispatcher |
//! +----------------+  +----------------------+      +------------------------+
//!                               ^
//!                               | periodic
//!                     +------------------+
//!                     |   JobRegistry    |  (reset sweep, failover sweep)
//!                     +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`FailureRecord`] - Failure count and window of one provider
//! - [`CronBinding`] - A scheduled job, its current provider and alternates
//! - [`SwitchOutcome`] - What one failover step did to one job
//! - [`ProviderConfig`] - Connection parameters of a provider
//! - [`ScrapeResult`] - Normalized payload handed back to callers
//!
//! # Type Aliases
//!
//! - [`ProviderId`] - Numeric provider identifier
//! - [`JobId`] - Numeric scheduled-job identifier

pub mod config;
pub mod counter;
pub mod errors;
pub mod failover;
pub mod jobs;
pub mod models;
pub mod normalize;
pub mod notify;
pub mod provider;
pub mod retry;
pub mod service;
pub mod store;

// Re-export all public types from models
pub use models::{
    AlternateEntry, BackendKind, CanonicalItem, CronBinding, FailureRecord, JobId,
    ProviderConfig, ProviderId, RawResponse, ScrapeResult, SwitchOutcome, Transition,
    EXHAUSTED_SEQUENCE,
};

// Re-export the resilience components
pub use config::ResilienceConfig;
pub use counter::{FailureCounter, FailureCounterConfig, SYSTEM_ACTOR};
pub use failover::{plan_transition, FailoverOrchestrator};
pub use jobs::{FailoverSweep, FailureResetSweep, JobRegistry, ScheduledTask};
pub use normalize::normalize;
pub use notify::{
    CacheInvalidator, HttpCacheInvalidator, LogSink, NoopCacheInvalidator, NotificationChannel,
    NotificationDispatcher, NotificationSink, WebhookSink, WebhookUrls,
};
pub use retry::{FailoverEscalation, RetryPolicy, RetryPolicyExecutor, RetryState};
pub use service::{ResilienceStack, ScrapeService, StoreHandles};

// Re-export provider types
pub use provider::generic_scrape::GenericScrapeAdapter;
pub use provider::headless_render::HeadlessRenderAdapter;
pub use provider::json_envelope::JsonEnvelopeAdapter;
pub use provider::long_poll::LongPollAdapter;
pub use provider::{AdapterRegistry, BackendAdapter, BackendError, BackendErrorKind};

// Re-export store types
pub use store::{
    CronBindingStore, FailureCounterStore, InMemoryBindingStore, InMemoryFailureStore,
    InMemoryProviderStore, MemoryStores, ProviderConfigStore, SeedData,
};

// Re-export error types
pub use errors::{RetryClass, ScrapeError};
