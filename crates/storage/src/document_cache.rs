//! Rendered capabilities document caching.
//!
//! Camouflaged capabilities documents are expensive to produce (parse, map,
//! project, serialize) and identical for every caller of the same service, so
//! the rendered XML is kept under `document_{title}_{version}_{key}`.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::KeyValueCache;

/// Default lifetime of a rendered document: 30 minutes.
pub const DEFAULT_DOCUMENT_TTL_SECS: u64 = 30 * 60;

/// Cache for rendered capabilities documents.
///
/// Cache failures never fail the caller: reads degrade to a miss and writes
/// are logged and dropped.
pub struct DocumentCache {
    cache: Arc<dyn KeyValueCache>,
    ttl: Duration,
}

impl DocumentCache {
    pub fn new(cache: Arc<dyn KeyValueCache>, ttl_secs: u64) -> Self {
        info!(ttl_secs = ttl_secs, "Initializing capabilities document cache");
        Self {
            cache,
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    /// Cache key for a document. `key` distinguishes variants of the same
    /// service document, e.g. the proxy base it was camouflaged for.
    pub fn cache_key(title: &str, version: &str, key: &str) -> String {
        format!("document_{}_{}_{}", title, version, key)
    }

    pub async fn get(&self, title: &str, version: &str, key: &str) -> Option<String> {
        let cache_key = Self::cache_key(title, version, key);
        match self.cache.get(&cache_key).await {
            Ok(Some(xml)) => {
                debug!(key = %cache_key, "Capabilities document cache hit");
                Some(xml)
            }
            Ok(None) => {
                debug!(key = %cache_key, "Capabilities document cache miss");
                None
            }
            Err(e) => {
                warn!(key = %cache_key, error = %e, "Capabilities document cache read failed");
                None
            }
        }
    }

    pub async fn set(&self, title: &str, version: &str, key: &str, xml: &str) {
        let cache_key = Self::cache_key(title, version, key);
        if let Err(e) = self.cache.set(&cache_key, xml, self.ttl).await {
            warn!(key = %cache_key, error = %e, "Capabilities document cache write failed");
        } else {
            debug!(key = %cache_key, bytes = xml.len(), "Capabilities document cached");
        }
    }

    pub async fn invalidate(&self, title: &str, version: &str, key: &str) {
        let cache_key = Self::cache_key(title, version, key);
        if let Err(e) = self.cache.delete(&cache_key).await {
            warn!(key = %cache_key, error = %e, "Capabilities document cache delete failed");
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl.as_secs()
    }
}

/// Create a document cache from environment configuration.
///
/// Environment variable: CAPABILITIES_DOCUMENT_TTL_SECS (default: 1800)
pub fn create_document_cache(cache: Arc<dyn KeyValueCache>) -> Arc<DocumentCache> {
    let ttl_secs = std::env::var("CAPABILITIES_DOCUMENT_TTL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_DOCUMENT_TTL_SECS);

    Arc::new(DocumentCache::new(cache, ttl_secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryCache;

    #[test]
    fn test_cache_key_format() {
        assert_eq!(
            DocumentCache::cache_key("Roads", "1.3.0", "proxy"),
            "document_Roads_1.3.0_proxy"
        );
    }

    #[tokio::test]
    async fn test_round_trip() {
        let cache = DocumentCache::new(Arc::new(MemoryCache::new(8)), 60);
        cache.set("Roads", "1.3.0", "k", "<xml/>").await;
        assert_eq!(cache.get("Roads", "1.3.0", "k").await, Some("<xml/>".to_string()));
        assert_eq!(cache.get("Roads", "1.1.1", "k").await, None);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = DocumentCache::new(Arc::new(MemoryCache::new(8)), 60);
        cache.set("Roads", "1.3.0", "k", "<xml/>").await;
        cache.invalidate("Roads", "1.3.0", "k").await;
        assert!(cache.get("Roads", "1.3.0", "k").await.is_none());
    }

    #[test]
    fn test_default_ttl() {
        let cache = DocumentCache::new(Arc::new(MemoryCache::new(8)), DEFAULT_DOCUMENT_TTL_SECS);
        assert_eq!(cache.ttl_secs(), 1800);
    }
}
