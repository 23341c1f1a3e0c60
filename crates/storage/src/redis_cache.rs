//! Redis-backed key/value cache.

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use std::time::Duration;
use tracing::debug;

use ows_common::{OwsError, OwsResult};

use crate::KeyValueCache;

/// Shared cache for deployments running more than one process.
///
/// The multiplexed connection is cloned per command, so one `RedisCache` can
/// serve concurrent callers without locking.
#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
}

impl RedisCache {
    /// Connect to Redis.
    pub async fn connect(redis_url: &str) -> OwsResult<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| OwsError::CacheError(format!("Redis connection failed: {}", e)))?;

        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| OwsError::CacheError(format!("Redis connection failed: {}", e)))?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl KeyValueCache for RedisCache {
    async fn get(&self, key: &str) -> OwsResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| OwsError::CacheError(format!("Cache get failed: {}", e)))?;
        debug!(key = key, hit = value.is_some(), "Redis cache lookup");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> OwsResult<()> {
        let mut conn = self.conn.clone();
        // SETEX rejects a zero expiry.
        let seconds = ttl.as_secs().max(1);
        let _: () = conn
            .set_ex(key, value, seconds)
            .await
            .map_err(|e| OwsError::CacheError(format!("Cache set failed: {}", e)))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> OwsResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(key)
            .await
            .map_err(|e| OwsError::CacheError(format!("Cache delete failed: {}", e)))?;
        Ok(())
    }
}
