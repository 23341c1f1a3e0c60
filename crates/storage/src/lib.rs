//! Cache abstractions for the OWS security core.
//!
//! Provides:
//! - `KeyValueCache`: the async string cache the EPSG registry and document
//!   cache are written against
//! - `MemoryCache`: in-process LRU cache with per-entry TTL
//! - `RedisCache`: shared Redis-backed cache
//! - `DocumentCache`: rendered capabilities documents keyed by title and version

pub mod cache;
pub mod document_cache;
pub mod memory_cache;
pub mod redis_cache;

pub use cache::KeyValueCache;
pub use document_cache::{create_document_cache, DocumentCache};
pub use memory_cache::{MemoryCache, MemoryCacheStats};
pub use redis_cache::RedisCache;
