//! Error types and retry classification for the scraper crate.
//!
//! This module provides:
//! - [`ScrapeError`]: The main error enum for store, configuration and notification failures
//! - [`RetryClass`]: Classification of a backend failure for the retry executor

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

use crate::models::ProviderId;

/// Type alias for Result using our error type.
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Errors that can occur in the resilience layer.
///
/// Backend failures are carried as [`BackendError`](crate::provider::BackendError)
/// inside the retry loop and only surface here once they have been classified.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// A backend failure that matched the adapter's retry predicate.
    #[error("Transient backend error: {provider} - {message}")]
    Transient {
        /// The provider that failed
        provider: String,
        /// The error message from the backend
        message: String,
    },

    /// A backend failure that is not worth retrying.
    #[error("Permanent backend error: {provider} - {message}")]
    Permanent {
        /// The provider that failed
        provider: String,
        /// The error message from the backend
        message: String,
    },

    /// No provider configuration could be resolved for a provider id.
    /// Fatal for the request, never retried.
    #[error("No provider configuration for provider {0}")]
    Configuration(ProviderId),

    /// The retry budget was consumed without a successful fetch.
    #[error("Retries exhausted for {provider} after {attempts} attempts")]
    RetriesExhausted {
        /// The provider that kept failing
        provider: String,
        /// Total number of attempts made
        attempts: u32,
    },

    /// A record the operation depends on does not exist.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A collaborator store failed.
    #[error("Store operation failed: {0}")]
    Store(String),

    /// A notification or cache-invalidation call failed.
    #[error("Notification failed: {0}")]
    Notification(String),

    /// A backend payload could not be parsed.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// A network error occurred outside of a backend fetch.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ScrapeError {
    /// A classified backend failure.
    pub fn backend(provider: impl Into<String>, message: impl Into<String>, class: RetryClass) -> Self {
        let provider = provider.into();
        let message = message.into();
        match class {
            RetryClass::Transient => Self::Transient { provider, message },
            RetryClass::Permanent => Self::Permanent { provider, message },
        }
    }

    /// Returns true for failures worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Returns true when the error describes a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<serde_json::Error> for ScrapeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
