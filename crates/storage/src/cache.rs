//! Key/value cache abstraction.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use ows_common::OwsResult;

/// String cache with per-entry expiry.
///
/// Implementations must be safe to share between tasks; callers hold them
/// behind an `Arc<dyn KeyValueCache>`.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Fetch a value. Expired and missing entries both yield `None`.
    async fn get(&self, key: &str) -> OwsResult<Option<String>>;

    /// Store a value that expires after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> OwsResult<()>;

    async fn delete(&self, key: &str) -> OwsResult<()>;
}

#[async_trait]
impl<C: KeyValueCache + ?Sized> KeyValueCache for Arc<C> {
    async fn get(&self, key: &str) -> OwsResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> OwsResult<()> {
        (**self).set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> OwsResult<()> {
        (**self).delete(key).await
    }
}
