//! In-memory store of decoded assets.
//!
//! The cache is the single source of truth for whether a URI is available.
//! Entries are never evicted: once a URI resolves it stays resolvable for
//! the lifetime of the cache without further I/O.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use crate::types::Asset;

/// A cache of decoded assets keyed by URI.
///
/// Cloning an `AssetCache` yields another handle to the same storage.
#[derive(Debug, Default, Clone)]
pub struct AssetCache {
    entries: Arc<RwLock<HashMap<String, Arc<Asset>>>>,
}

impl AssetCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether an asset is cached for `uri`.
    #[must_use]
    pub fn has(&self, uri: &str) -> bool {
        self.read(|entries| entries.contains_key(uri))
    }

    /// Get the cached asset for `uri`.
    #[must_use]
    pub fn get(&self, uri: &str) -> Option<Arc<Asset>> {
        self.read(|entries| entries.get(uri).cloned())
    }

    /// Store an asset under its own URI.
    ///
    /// Storing a second asset for the same URI replaces the first.
    pub fn put(&self, asset: Arc<Asset>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(asset.uri.clone(), asset);
    }

    /// Get the number of cached assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read(HashMap::len)
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The URIs currently cached, in no particular order.
    #[must_use]
    pub fn uris(&self) -> Vec<String> {
        self.read(|entries| entries.keys().cloned().collect())
    }

    fn read<R>(&self, f: impl FnOnce(&HashMap<String, Arc<Asset>>) -> R) -> R {
        f(&self.entries.read().unwrap_or_else(PoisonError::into_inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Content;

    fn asset(uri: &str, text: &str) -> Arc<Asset> {
        Arc::new(Asset {
            uri: uri.to_string(),
            content_type: "text/plain".to_string(),
            content: Content::Text(text.to_string()),
        })
    }

    #[test]
    fn test_cache_basic() {
        let cache = AssetCache::new();

        // Initially empty.
        assert!(cache.is_empty());
        assert!(!cache.has("a.txt"));
        assert!(cache.get("a.txt").is_none());

        let a = asset("a.txt", "alpha");
        cache.put(Arc::clone(&a));
        assert!(cache.has("a.txt"));
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&cache.get("a.txt").unwrap(), &a));
        assert!(!cache.has("b.txt"));
    }

    #[test]
    fn test_cache_put_twice_last_wins() {
        let cache = AssetCache::new();
        cache.put(asset("a.txt", "first"));
        cache.put(asset("a.txt", "second"));

        assert_eq!(cache.len(), 1);
        let stored = cache.get("a.txt").unwrap();
        assert_eq!(stored.content.as_text(), Some("second"));
    }

    #[test]
    fn test_cache_clones_share_storage() {
        let cache = AssetCache::new();
        let other = cache.clone();
        cache.put(asset("a.txt", "alpha"));

        assert!(other.has("a.txt"));
        assert_eq!(other.uris(), vec!["a.txt".to_string()]);
    }
}
