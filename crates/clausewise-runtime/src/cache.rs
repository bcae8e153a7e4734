//! Caching layer for clausewise-runtime.
//!
//! Keeps the last good narrative per document fingerprint so a provider
//! outage can still serve a real narrative for a contract seen before.

use moka::future::Cache;
use std::time::Duration;

use crate::config::CacheConfig;
use crate::narrative::Narrative;

/// Narrative cache using moka, keyed by document fingerprint.
pub struct NarrativeCache {
    cache: Cache<String, Narrative>,
}

impl NarrativeCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries, config.ttl)
    }

    pub async fn get(&self, fingerprint: &str) -> Option<Narrative> {
        self.cache.get(fingerprint).await
    }

    /// Store a narrative, replacing any older one for the same document.
    pub async fn insert(&self, fingerprint: impl Into<String>, narrative: Narrative) {
        self.cache.insert(fingerprint.into(), narrative).await;
    }
}

impl Default for NarrativeCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}
