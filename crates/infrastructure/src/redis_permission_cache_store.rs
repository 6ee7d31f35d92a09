//! Redis-backed permission decision cache.

use async_trait::async_trait;
use leasewell_application::CacheStore;
use leasewell_core::{AppError, AppResult};
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;

/// Keys fetched per SCAN round trip.
const SCAN_BATCH_SIZE: usize = 500;

/// Redis implementation of the cache store port.
#[derive(Clone)]
pub struct RedisPermissionCacheStore {
    client: redis::Client,
    key_prefix: String,
}

impl RedisPermissionCacheStore {
    /// Creates a store with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn key_for(&self, key: &str) -> String {
        format!("{}:{key}", self.key_prefix)
    }

    async fn connection(&self) -> AppResult<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Cache(format!("failed to connect to redis: {error}")))
    }
}

#[async_trait]
impl CacheStore for RedisPermissionCacheStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut connection = self.connection().await?;
        connection
            .get(self.key_for(key))
            .await
            .map_err(|error| AppError::Cache(format!("failed to read cache entry: {error}")))
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let mut connection = self.connection().await?;
        connection
            .set_ex(self.key_for(key), value, ttl_seconds)
            .await
            .map_err(|error| AppError::Cache(format!("failed to write cache entry: {error}")))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut connection = self.connection().await?;
        let _: i64 = connection
            .del(self.key_for(key))
            .await
            .map_err(|error| AppError::Cache(format!("failed to delete cache entry: {error}")))?;
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        let namespace = format!("{}:", self.key_prefix);
        let pattern = format!("{}*", escape_glob(&self.key_for(prefix)));
        let mut connection = self.connection().await?;

        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH_SIZE)
                .query_async(&mut connection)
                .await
                .map_err(|error| AppError::Cache(format!("failed to scan cache keys: {error}")))?;

            keys.extend(
                batch
                    .into_iter()
                    .filter_map(|key| key.strip_prefix(&namespace).map(str::to_owned)),
            );

            if next_cursor == 0 {
                break;
            }
            cursor = next_cursor;
        }

        // SCAN may return a key more than once.
        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }
}

fn escape_glob(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        if matches!(character, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::escape_glob;

    #[test]
    fn glob_metacharacters_are_escaped() {
        assert_eq!(escape_glob("permission:a*b?[c]"), "permission:a\\*b\\?\\[c\\]");
        assert_eq!(escape_glob("permission:plain:"), "permission:plain:");
    }
}
