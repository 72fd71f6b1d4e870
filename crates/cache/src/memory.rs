use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    CacheError, Result,
    store::{CacheStats, CacheStore},
};

struct Entry {
    value: Value,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory cache backend.
///
/// Entries expire lazily on access. `set_fail` flips the store into a
/// failing mode so callers' degradation paths can be exercised in tests.
#[derive(Clone, Default)]
pub struct InMemoryCacheStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    fail: Arc<AtomicBool>,
}

impl InMemoryCacheStore {
    /// Creates a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with a backend error.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("backend unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        self.check_available()?;
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry.value.clone()))
            }
            Some(_) => {
                entries.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        self.check_available()?;
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check_available()?;
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64> {
        self.check_available()?;
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }

    async fn clear(&self) -> Result<()> {
        self.check_available()?;
        self.entries.write().await.clear();
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats> {
        self.check_available()?;
        let entries = self.entries.read().await;
        let live = entries.values().filter(|e| !e.is_expired()).count();
        Ok(CacheStats {
            entries: live,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        })
    }
}
