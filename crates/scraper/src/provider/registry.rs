//! Backend kind to adapter lookup, built once at configuration time.

use std::collections::HashMap;
use std::sync::Arc;

use log::warn;
use reqwest::Client;

use super::generic_scrape::GenericScrapeAdapter;
use super::headless_render::HeadlessRenderAdapter;
use super::json_envelope::JsonEnvelopeAdapter;
use super::long_poll::LongPollAdapter;
use super::BackendAdapter;
use crate::config::ResilienceConfig;
use crate::models::BackendKind;

/// Maps each [`BackendKind`] to the adapter that speaks it.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<BackendKind, Arc<dyn BackendAdapter>>,
}

impl AdapterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in adapters, sharing one HTTP client.
    pub fn with_defaults(client: Client, config: &ResilienceConfig) -> Self {
        let timeout = config.request_timeout();
        let mut registry = Self::new();
        registry.register(Arc::new(JsonEnvelopeAdapter::new(client.clone(), timeout)));
        registry.register(Arc::new(HeadlessRenderAdapter::new(client.clone(), timeout)));
        registry.register(Arc::new(GenericScrapeAdapter::new(client.clone(), timeout)));
        registry.register(Arc::new(LongPollAdapter::new(
            client,
            timeout,
            config.poll_interval(),
            config.max_polls,
        )));
        registry
    }

    /// Register an adapter under its own kind, replacing any previous one.
    pub fn register(&mut self, adapter: Arc<dyn BackendAdapter>) {
        if let Some(previous) = self.adapters.insert(adapter.kind(), adapter) {
            warn!("Adapter registry: replaced adapter for '{}'", previous.kind());
        }
    }

    /// The adapter for a backend kind.
    pub fn get(&self, kind: BackendKind) -> Option<Arc<dyn BackendAdapter>> {
        self.adapters.get(&kind).cloned()
    }

    /// All registered adapters.
    pub fn adapters(&self) -> impl Iterator<Item = &Arc<dyn BackendAdapter>> {
        self.adapters.values()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
