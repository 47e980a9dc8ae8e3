use std::collections::HashMap;
use std::time::SystemTime;

use async_trait::async_trait;
use feishu_core::{namespaced_key, Cache, FeishuError};
use serde_json::Value;
use tokio::sync::RwLock;

struct CacheEntry {
    value: Value,
    expired_at: Option<SystemTime>,
}

impl CacheEntry {
    fn is_expired(&self, now: SystemTime) -> bool {
        self.expired_at.is_some_and(|at| at <= now)
    }
}

/// The live value under `key`; an expired entry is removed instead.
fn fresh_or_evict(
    store: &mut HashMap<String, CacheEntry>,
    key: &str,
    now: SystemTime,
) -> Option<Value> {
    match store.get(key) {
        Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
        Some(_) => {
            store.remove(key);
            None
        }
        None => None,
    }
}

/// In-process cache with lazy expiry.
///
/// Expiry is checked when an entry is read; a stale entry is evicted at that
/// point and reported as a miss. Nothing sweeps the map in the background.
pub struct InMemoryCache {
    store: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored entries, including expired ones not yet read.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    /// Expiry of a live entry; `None` for a missing or never-expiring entry.
    pub async fn expires_at(&self, key: &str, namespace: Option<&str>) -> Option<SystemTime> {
        let store = self.store.read().await;
        store
            .get(&namespaced_key(key, namespace))
            .and_then(|entry| entry.expired_at)
    }

    pub async fn clear(&self) {
        self.store.write().await.clear();
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str, namespace: Option<&str>) -> Result<Option<Value>, FeishuError> {
        let full_key = namespaced_key(key, namespace);
        let now = SystemTime::now();
        {
            let store = self.store.read().await;
            match store.get(&full_key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Another writer may have refreshed the entry between the two locks.
        let mut store = self.store.write().await;
        Ok(fresh_or_evict(&mut store, &full_key, now))
    }

    async fn set(
        &self,
        key: &str,
        value: Value,
        expires_at: Option<SystemTime>,
        namespace: Option<&str>,
    ) -> Result<bool, FeishuError> {
        let mut store = self.store.write().await;
        store.insert(
            namespaced_key(key, namespace),
            CacheEntry {
                value,
                expired_at: expires_at,
            },
        );
        Ok(true)
    }
}
