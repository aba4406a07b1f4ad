//! In-memory TTL cache.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;

use geoproxy_core::error::Result;
use geoproxy_core::traits::CacheStore;

/// Cache entry with TTL.
#[derive(Clone)]
struct CacheEntry {
    value: Vec<u8>,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() >= self.ttl
    }
}

/// Cache configuration.
#[derive(Clone, Debug)]
pub struct MemoryCacheConfig {
    /// Maximum number of entries
    pub max_entries: usize,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self { max_entries: 10_000 }
    }
}

/// In-process cache of opaque blobs keyed by query.
///
/// Thread-safe; expired entries read as misses and are purged lazily.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    config: MemoryCacheConfig,
}

impl MemoryCache {
    /// Creates a new cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(MemoryCacheConfig::default())
    }

    /// Creates a cache with custom configuration.
    pub fn with_config(config: MemoryCacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Returns the live value for `key`, if any. Keys are compared verbatim.
    pub fn lookup(&self, key: &str) -> Option<Vec<u8>> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|e| !e.is_expired())
            .map(|e| e.value.clone())
    }

    /// Stores `value` under `key` until `ttl` elapses.
    pub fn insert(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        let mut entries = self.entries.write();

        if entries.len() >= self.config.max_entries && !entries.contains_key(key) {
            entries.retain(|_, e| !e.is_expired());

            if entries.len() >= self.config.max_entries {
                if let Some(oldest_key) = entries
                    .iter()
                    .min_by_key(|(_, e)| e.inserted_at)
                    .map(|(k, _)| k.clone())
                {
                    entries.remove(&oldest_key);
                }
            }
        }

        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Removes a cached entry.
    pub fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }

    /// Clears all cached entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Removes all expired entries.
    pub fn cleanup_expired(&self) {
        self.entries.write().retain(|_, e| !e.is_expired());
    }

    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        let expired = entries.values().filter(|e| e.is_expired()).count();
        CacheStats {
            total_entries: entries.len(),
            expired_entries: expired,
            valid_entries: entries.len().saturating_sub(expired),
            capacity: self.config.max_entries,
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.lookup(key))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        self.insert(key, value, ttl);
        Ok(())
    }
}

/// Cache statistics.
#[derive(Clone, Debug)]
pub struct CacheStats {
    /// Total entries (including expired)
    pub total_entries: usize,
    /// Expired entries
    pub expired_entries: usize,
    /// Valid (non-expired) entries
    pub valid_entries: usize,
    /// Maximum capacity
    pub capacity: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_cache_set_get() {
        let cache = MemoryCache::new();
        cache.insert("Berlin", b"[1]".to_vec(), HOUR);
        assert_eq!(cache.lookup("Berlin").unwrap(), b"[1]".to_vec());
    }

    #[test]
    fn test_cache_keys_are_verbatim() {
        let cache = MemoryCache::new();
        cache.insert("Berlin", b"[]".to_vec(), HOUR);
        assert!(cache.lookup("berlin").is_none());
        assert!(cache.lookup(" Berlin").is_none());
    }

    #[test]
    fn test_cache_empty_key() {
        let cache = MemoryCache::new();
        cache.insert("", b"[]".to_vec(), HOUR);
        assert_eq!(cache.lookup("").unwrap(), b"[]".to_vec());
    }

    #[test]
    fn test_cache_miss() {
        let cache = MemoryCache::new();
        assert!(cache.lookup("Atlantis").is_none());
    }

    #[test]
    fn test_cache_overwrite() {
        let cache = MemoryCache::new();
        cache.insert("Berlin", b"old".to_vec(), HOUR);
        cache.insert("Berlin", b"new".to_vec(), HOUR);
        assert_eq!(cache.lookup("Berlin").unwrap(), b"new".to_vec());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_remove() {
        let cache = MemoryCache::new();
        cache.insert("Berlin", b"[]".to_vec(), HOUR);
        cache.remove("Berlin");
        assert!(cache.lookup("Berlin").is_none());
    }

    #[test]
    fn test_cache_clear() {
        let cache = MemoryCache::new();
        cache.insert("Berlin", b"[]".to_vec(), HOUR);
        cache.insert("Paris", b"[]".to_vec(), HOUR);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_ttl_expiration() {
        let cache = MemoryCache::new();
        cache.insert("Berlin", b"[]".to_vec(), Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.lookup("Berlin").is_none());
    }

    #[test]
    fn test_cache_zero_ttl_is_never_live() {
        let cache = MemoryCache::new();
        cache.insert("Berlin", b"[]".to_vec(), Duration::ZERO);
        assert!(cache.lookup("Berlin").is_none());
    }

    #[test]
    fn test_cache_capacity_eviction() {
        let cache = MemoryCache::with_config(MemoryCacheConfig { max_entries: 2 });
        cache.insert("Berlin", b"[]".to_vec(), HOUR);
        std::thread::sleep(Duration::from_millis(2));
        cache.insert("Paris", b"[]".to_vec(), HOUR);
        cache.insert("Rome", b"[]".to_vec(), HOUR);
        assert_eq!(cache.len(), 2);
        assert!(cache.lookup("Berlin").is_none());
        assert!(cache.lookup("Rome").is_some());
    }

    #[test]
    fn test_cache_capacity_prefers_expired() {
        let cache = MemoryCache::with_config(MemoryCacheConfig { max_entries: 2 });
        cache.insert("Paris", b"[]".to_vec(), HOUR);
        cache.insert("Berlin", b"[]".to_vec(), Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(10));
        cache.insert("Rome", b"[]".to_vec(), HOUR);
        assert!(cache.lookup("Paris").is_some());
        assert!(cache.lookup("Rome").is_some());
    }

    #[test]
    fn test_cache_stats() {
        let cache = MemoryCache::new();
        cache.insert("Berlin", b"[]".to_vec(), HOUR);
        cache.insert("Paris", b"[]".to_vec(), HOUR);
        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.valid_entries, 2);
        assert_eq!(stats.capacity, 10_000);
    }

    #[test]
    fn test_cache_cleanup_expired() {
        let cache = MemoryCache::new();
        cache.insert("Berlin", b"[]".to_vec(), Duration::from_millis(1));
        cache.insert("Paris", b"[]".to_vec(), HOUR);
        std::thread::sleep(Duration::from_millis(10));
        cache.cleanup_expired();
        assert_eq!(cache.len(), 1);
        assert!(cache.lookup("Paris").is_some());
    }

    #[tokio::test]
    async fn test_cache_store_trait() {
        let cache = MemoryCache::new();
        let store: &dyn CacheStore = &cache;
        assert_eq!(store.get("Berlin").await.unwrap(), None);
        store.set("Berlin", b"[]".to_vec(), HOUR).await.unwrap();
        assert_eq!(store.get("Berlin").await.unwrap(), Some(b"[]".to_vec()));
    }
}
