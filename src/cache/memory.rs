use super::CacheResult;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Cache entry with expiration
#[derive(Clone, Debug)]
struct CacheEntry {
    data: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(data: String, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.map(|duration| Instant::now() + duration);
        Self { data, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }
}

/// A writer may have refreshed the key since the expired read, so check again
fn remove_if_expired(store: &mut HashMap<String, CacheEntry>, key: &str) -> bool {
    if store.get(key).is_some_and(CacheEntry::is_expired) {
        store.remove(key);
        true
    } else {
        false
    }
}

/// In-memory cache for single-instance deployments and tests.
///
/// Expiry is measured on the tokio clock, so tests running with a paused
/// runtime can move entries past their TTL with `tokio::time::advance`.
#[derive(Clone, Default)]
pub struct MemoryCache {
    store: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let store = self.store.read().await;

        match store.get(key) {
            Some(entry) if entry.is_expired() => {
                drop(store);
                let mut store = self.store.write().await;
                remove_if_expired(&mut store, key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.data.clone())),
            None => Ok(None),
        }
    }

    pub async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let entry = CacheEntry::new(value, ttl);
        let mut store = self.store.write().await;
        store.insert(key.to_string(), entry);
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut store = self.store.write().await;
        store.remove(key);
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Remove and return the value under a single write lock
    pub async fn take(&self, key: &str) -> CacheResult<Option<String>> {
        let mut store = self.store.write().await;
        Ok(store
            .remove(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.data))
    }

    /// Drop every expired entry, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|_, entry| !entry.is_expired());
        before - store.len()
    }

}
