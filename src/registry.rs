//! Named sources of a service.
//!
//! A service usually talks to several data sources and looks them up by
//! name per request. [`SourceRegistry`] is that lookup table: concurrent
//! reads and registrations, no global state.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use crate::source::Source;

pub struct SourceRegistry {
    name: String,
    tag: String,
    sources: DashMap<String, Arc<Source>>,
}

impl SourceRegistry {
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self { name: name.into(), tag: tag.into(), sources: DashMap::new() }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn tag(&self) -> &str { &self.tag }

    /// Registers `source` under its own name. Returns the source it replaced.
    pub fn register(&self, source: impl Into<Arc<Source>>) -> Option<Arc<Source>> {
        let source = source.into();
        info!(service = %self.name, source = %source.name(), "source registered");
        self.sources.insert(source.name().to_owned(), source)
    }

    pub fn register_all<S: Into<Arc<Source>>>(&self, sources: impl IntoIterator<Item = S>) {
        for source in sources {
            self.register(source);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Source>> {
        self.sources.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, name: &str) -> Option<Arc<Source>> {
        self.sources.remove(name).map(|(_, source)| source)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sources.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }
}
