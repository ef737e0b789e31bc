//! In-memory LRU cache for dataset metadata.
//!
//! Opening a dataset and reading its overview structure costs a round trip
//! to the store, so metadata is cached per dataset id and shared between
//! requests. Entries leave the cache by LRU eviction at capacity or through
//! `invalidate` / `clear`.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::RwLock;

use crate::metadata::RasterMetadata;

/// Statistics for the metadata cache
#[derive(Debug, Default, Clone)]
pub struct MetadataCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub invalidations: u64,
}

impl MetadataCacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// LRU cache of dataset metadata keyed by dataset id.
pub struct MetadataCache {
    cache: Arc<RwLock<LruCache<String, Arc<RasterMetadata>>>>,
    stats: Arc<RwLock<MetadataCacheStats>>,
    capacity: usize,
}

impl MetadataCache {
    /// Create a cache holding at most `capacity` datasets (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let size = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: Arc::new(RwLock::new(LruCache::new(size))),
            stats: Arc::new(RwLock::new(MetadataCacheStats::default())),
            capacity: size.get(),
        }
    }

    /// Get metadata from the cache.
    ///
    /// Returns None on cache miss - caller should load and insert.
    pub async fn get(&self, dataset: &str) -> Option<Arc<RasterMetadata>> {
        let mut cache = self.cache.write().await;
        let found = cache.get(dataset).cloned();

        let mut stats = self.stats.write().await;
        if found.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        found
    }

    /// Insert metadata, replacing any previous entry for the dataset.
    pub async fn insert(&self, dataset: impl Into<String>, metadata: Arc<RasterMetadata>) {
        let mut cache = self.cache.write().await;
        cache.put(dataset.into(), metadata);

        let mut stats = self.stats.write().await;
        stats.entries = cache.len();
    }

    /// Drop the entry for one dataset. Returns whether it was cached.
    pub async fn invalidate(&self, dataset: &str) -> bool {
        let mut cache = self.cache.write().await;
        let removed = cache.pop(dataset).is_some();

        let mut stats = self.stats.write().await;
        stats.entries = cache.len();
        if removed {
            stats.invalidations += 1;
        }
        removed
    }

    /// Get current cache statistics.
    pub async fn stats(&self) -> MetadataCacheStats {
        let cache = self.cache.read().await;
        let mut stats = self.stats.write().await;
        stats.entries = cache.len();
        stats.clone()
    }

    /// Clear the cache.
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();

        let mut stats = self.stats.write().await;
        *stats = MetadataCacheStats::default();
    }

    /// Get cache capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get current number of entries in cache.
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Check if cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }
}
