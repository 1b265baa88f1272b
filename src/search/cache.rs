//! Bounded search result cache
//!
//! Eviction follows insertion order: reads go through `peek`, which never
//! promotes an entry, so the least-recently *inserted* key is dropped first.

use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use tracing::debug;

use super::filter::FilterSpec;
use super::SearchOutcome;

/// Default number of cached result sets
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

#[derive(Serialize)]
struct KeyParts<'a> {
    query: &'a str,
    filters: &'a FilterSpec,
    fuzzy: bool,
}

/// Serialized identity of a (query, filters, fuzzy) triple
///
/// Returns `None` if the parts cannot be serialized; callers skip caching then.
pub fn cache_key(query: &str, filters: &FilterSpec, fuzzy: bool) -> Option<String> {
    match serde_json::to_string(&KeyParts { query, filters, fuzzy }) {
        Ok(key) => Some(key),
        Err(e) => {
            debug!("Skipping cache, key serialization failed: {}", e);
            None
        }
    }
}

/// Insertion-ordered result cache with a fixed capacity
pub struct ResultCache {
    entries: Option<LruCache<String, SearchOutcome>>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl ResultCache {
    /// A capacity of zero disables caching entirely
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
        }
    }

    /// Snapshot of the cached outcome; the stored entry stays untouched
    pub fn get(&self, key: &str) -> Option<SearchOutcome> {
        self.entries.as_ref()?.peek(key).cloned()
    }

    pub fn insert(&mut self, key: String, outcome: SearchOutcome) {
        let Some(entries) = self.entries.as_mut() else {
            return;
        };

        // Replacing keeps the original insertion slot
        if let Some(existing) = entries.peek_mut(&key) {
            *existing = outcome;
            return;
        }

        if let Some((evicted, _)) = entries.push(key, outcome) {
            debug!("Evicted oldest cache entry: {}", evicted);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.as_ref().is_some_and(|e| e.contains(key))
    }

    pub fn clear(&mut self) {
        if let Some(entries) = self.entries.as_mut() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.as_ref().map_or(0, |e| e.cap().get())
    }
}
