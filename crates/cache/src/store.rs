use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Point-in-time statistics about the cache backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of live (unexpired) entries.
    pub entries: usize,
    /// Reads answered from the cache.
    pub hits: u64,
    /// Reads that found nothing (or only an expired entry).
    pub misses: u64,
}

/// Key-value cache backend with per-entry expiry.
///
/// Keys are independent; no operation here spans more than one logical
/// key except [`delete_prefix`](CacheStore::delete_prefix) and
/// [`clear`](CacheStore::clear), which exist for list invalidation and
/// the admin clear endpoint.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the value stored under `key`, if present and unexpired.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` under `key` for `ttl`.
    ///
    /// Entries not explicitly invalidated expire naturally.
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()>;

    /// Deletes a single key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Deletes every key starting with `prefix`; returns how many.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64>;

    /// Deletes everything.
    async fn clear(&self) -> Result<()>;

    /// Returns backend statistics.
    async fn stats(&self) -> Result<CacheStats>;
}
