//! Backend adapter trait definition.
//!
//! This module defines the `BackendAdapter` trait every scraping backend
//! implements.

use async_trait::async_trait;

use crate::errors::RetryClass;
use crate::models::{BackendKind, ProviderConfig, RawResponse};

use super::error::BackendError;

/// Trait for scraping backends.
///
/// Implement this trait to add support for a new backend. The adapter owns its
/// wire protocol; the retry executor only sees `fetch` and `is_retryable`.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use repricer_scraper::provider::{BackendAdapter, BackendError};
///
/// struct MyBackend {
///     client: reqwest::Client,
/// }
///
/// #[async_trait]
/// impl BackendAdapter for MyBackend {
///     fn kind(&self) -> BackendKind {
///         BackendKind::GenericScrape
///     }
///
///     fn is_retryable(&self, error: &BackendError) -> bool {
///         error.status_in(&[429, 503])
///     }
///
///     // ... implement fetch
/// }
/// ```
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// The backend family this adapter speaks.
    fn kind(&self) -> BackendKind;

    /// Fetch `url` through the provider described by `config`.
    ///
    /// # Returns
    ///
    /// The raw body on success, or a `BackendError` describing the transport
    /// failure.
    async fn fetch(&self, url: &str, config: &ProviderConfig) -> Result<RawResponse, BackendError>;

    /// Backend-specific retry predicate.
    fn is_retryable(&self, error: &BackendError) -> bool;

    /// Classify a failure for the retry executor.
    fn classify(&self, error: &BackendError) -> RetryClass {
        if self.is_retryable(error) {
            RetryClass::Transient
        } else {
            RetryClass::Permanent
        }
    }
}
