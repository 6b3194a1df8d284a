//! Registry for managing provider client plugins.

use std::collections::HashMap;
use std::sync::Arc;

use super::{ArxivSource, SemanticScholarSource, Source, SourceError};
use crate::config::Config;

bitflags::bitflags! {
    /// Capabilities that a provider can support
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SourceCapabilities: u32 {
        const SEARCH = 1 << 0;
        const LOOKUP = 1 << 1;
        const EXTERNAL_ID_LOOKUP = 1 << 2;
    }
}

/// Registry for all available providers
///
/// The SourceRegistry holds one client per provider and hands out shared
/// handles, so per-provider state such as the Semantic Scholar token bucket
/// is not duplicated.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: HashMap<String, Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Create a new registry with all available providers
    pub fn new() -> Self {
        let mut registry = Self {
            sources: HashMap::new(),
        };

        registry.register(Arc::new(ArxivSource::new()));
        registry.register(Arc::new(SemanticScholarSource::new()));

        registry
    }

    /// Create a registry with providers built from application configuration
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self {
            sources: HashMap::new(),
        };

        registry.register(Arc::new(ArxivSource::from_config(config)));
        registry.register(Arc::new(SemanticScholarSource::from_config(config)));

        registry
    }

    /// Register a new provider
    pub fn register(&mut self, source: Arc<dyn Source>) {
        self.sources.insert(source.id().to_string(), source);
    }

    /// Get a provider by ID
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Source>> {
        self.sources.get(id)
    }

    /// Get a provider by ID, returning an error if not found
    pub fn get_required(&self, id: &str) -> Result<&Arc<dyn Source>, SourceError> {
        self.get(id)
            .ok_or_else(|| SourceError::InvalidRequest(format!("Unknown source '{}'", id)))
    }

    /// Get all registered providers
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.values()
    }

    /// Get all provider IDs
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(|s| s.as_str())
    }

    /// Get providers that support a specific capability
    pub fn with_capability(&self, capability: SourceCapabilities) -> Vec<&Arc<dyn Source>> {
        self.all()
            .filter(|s| s.capabilities().contains(capability))
            .collect()
    }

    /// Get providers that support search
    pub fn searchable(&self) -> Vec<&Arc<dyn Source>> {
        self.with_capability(SourceCapabilities::SEARCH)
    }

    /// Check if a provider exists
    pub fn has(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    /// Get the number of registered providers
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
