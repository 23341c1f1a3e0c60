//! In-memory LRU cache with lazy TTL expiry.
//!
//! Used where no Redis instance is configured, and by tests. Entries are
//! evicted in LRU order once `capacity` is reached; expired entries are
//! dropped when they are next read.

use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use ows_common::OwsResult;

use crate::KeyValueCache;

const DEFAULT_CAPACITY: usize = 10_000;

struct CachedValue {
    value: String,
    inserted_at: Instant,
    ttl: Duration,
}

impl CachedValue {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

/// Hit/miss counters for the memory cache.
#[derive(Default)]
pub struct MemoryCacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    /// Entries dropped because their TTL had passed
    pub expired: AtomicU64,
    /// Entries pushed out by the LRU bound
    pub evictions: AtomicU64,
}

impl MemoryCacheStats {
    /// Hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

/// Process-local [`KeyValueCache`].
pub struct MemoryCache {
    cache: Arc<RwLock<LruCache<String, CachedValue>>>,
    stats: Arc<MemoryCacheStats>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl MemoryCache {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Arc::new(RwLock::new(LruCache::new(capacity))),
            stats: Arc::new(MemoryCacheStats::default()),
        }
    }

    pub fn stats(&self) -> &MemoryCacheStats {
        &self.stats
    }

    /// Number of entries currently held, expired ones included.
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.cache.write().await.clear();
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> OwsResult<Option<String>> {
        let mut cache = self.cache.write().await;

        let expired = match cache.get(key) {
            Some(cached) if !cached.is_expired() => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = key, "Memory cache hit");
                return Ok(Some(cached.value.clone()));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            cache.pop(key);
            self.stats.expired.fetch_add(1, Ordering::Relaxed);
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = key, expired = expired, "Memory cache miss");
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> OwsResult<()> {
        let mut cache = self.cache.write().await;
        let entry = CachedValue {
            value: value.to_string(),
            inserted_at: Instant::now(),
            ttl,
        };
        if let Some((evicted_key, _)) = cache.push(key.to_string(), entry) {
            if evicted_key != key {
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> OwsResult<()> {
        self.cache.write().await.pop(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = MemoryCache::new(4);
        cache.set("a", "1", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), Some("1".to_string()));
        assert_eq!(cache.stats().hits.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_miss_when_empty() {
        let cache = MemoryCache::default();
        assert_eq!(cache.get("missing").await.unwrap(), None);
        assert_eq!(cache.stats().misses.load(Ordering::Relaxed), 1);
        assert_eq!(cache.stats().hit_rate(), 0.0);
    }

    #[tokio::test]
    async fn test_expired_entry_is_dropped() {
        let cache = MemoryCache::new(4);
        cache.set("a", "1", Duration::from_millis(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.get("a").await.unwrap(), None);
        assert_eq!(cache.stats().expired.load(Ordering::Relaxed), 1);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let cache = MemoryCache::new(2);
        let ttl = Duration::from_secs(60);
        cache.set("a", "1", ttl).await.unwrap();
        cache.set("b", "2", ttl).await.unwrap();
        // Touch "a" so "b" is least recently used.
        cache.get("a").await.unwrap();
        cache.set("c", "3", ttl).await.unwrap();

        assert_eq!(cache.get("b").await.unwrap(), None);
        assert_eq!(cache.get("a").await.unwrap(), Some("1".to_string()));
        assert_eq!(cache.stats().evictions.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_overwrite_is_not_an_eviction() {
        let cache = MemoryCache::new(2);
        let ttl = Duration::from_secs(60);
        cache.set("a", "1", ttl).await.unwrap();
        cache.set("a", "2", ttl).await.unwrap();

        assert_eq!(cache.get("a").await.unwrap(), Some("2".to_string()));
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.stats().evictions.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_delete_outside_runtime() {
        let cache = MemoryCache::new(2);
        tokio_test::block_on(async {
            cache.set("a", "1", Duration::from_secs(60)).await.unwrap();
            cache.delete("a").await.unwrap();
            assert_eq!(cache.get("a").await.unwrap(), None);
        });
    }
}
