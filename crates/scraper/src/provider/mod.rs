//! Scraping backend abstractions and implementations.
//!
//! This module contains:
//! - The `BackendAdapter` trait that all backends implement
//! - `BackendError`, the transport failure every adapter reports
//! - Concrete adapters (JSON envelope, headless render, generic scrape, long-poll)
//! - `AdapterRegistry`, mapping a backend kind to its adapter
//!
//! # Architecture
//!
//! The adapter system is designed to be:
//! - **Backend-agnostic**: The retry executor doesn't know about wire formats
//! - **Extensible**: New backends plug in by implementing `BackendAdapter`
//! - **Self-describing**: Each adapter decides which of its failures are retryable

mod error;
mod registry;
mod traits;

pub mod generic_scrape;
pub mod headless_render;
pub mod json_envelope;
pub mod long_poll;

// Re-exports
pub use error::{BackendError, BackendErrorKind, SOCKET_TIMEOUT_MARKER};
pub use registry::AdapterRegistry;
pub use traits::BackendAdapter;
