use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use leasewell_application::CacheStore;
use leasewell_core::AppResult;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// Process-local cache store for single-instance deployments and development.
///
/// Expired entries are dropped on every write.
#[derive(Default)]
pub struct InMemoryPermissionCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryPermissionCacheStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for InMemoryPermissionCacheStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            entries.remove(key);
        }

        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let now = Instant::now();
        let expires_at = now
            .checked_add(Duration::from_secs(ttl_seconds))
            .unwrap_or(now);

        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_owned(),
            CacheEntry {
                value: value.to_owned(),
                expires_at,
            },
        );

        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        let now = Instant::now();
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|(key, entry)| key.starts_with(prefix) && entry.expires_at > now)
            .map(|(key, _)| key.clone())
            .collect())
    }
}
