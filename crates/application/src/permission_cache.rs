//! TTL-bound cache of authorization decisions.

use std::sync::Arc;

use async_trait::async_trait;
use leasewell_core::AppResult;
use leasewell_domain::{OrganizationId, UserProfileId};
use tracing::debug;

/// Default lifetime of a cached decision.
pub const DEFAULT_PERMISSION_CACHE_TTL_SECONDS: u64 = 3_600;

const KEY_NAMESPACE: &str = "permission";
const ALLOWED: &str = "1";
const DENIED: &str = "0";

/// Port for a string key/value cache with expiry.
///
/// Failures are reported as `AppError::Cache` and treated as misses by callers.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the value stored under the key, if present and not expired.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Stores a value with a ttl. A zero ttl stores nothing.
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> AppResult<()>;

    /// Removes one key. Removing a missing key succeeds.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Lists keys starting with the prefix. Linear in the size of the key space.
    async fn scan_prefix(&self, prefix: &str) -> AppResult<Vec<String>>;
}

/// Cache key for one (subject, organization, feature, permission) decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PermissionCacheKey {
    subject: UserProfileId,
    organization_id: OrganizationId,
    feature: String,
    permission: String,
}

impl PermissionCacheKey {
    /// Builds a key.
    ///
    /// Names fold ASCII case only, matching how the catalogs compare them, so
    /// two keys collide only when both names resolve to the same rows.
    #[must_use]
    pub fn new(
        subject: UserProfileId,
        organization_id: OrganizationId,
        feature: &str,
        permission: &str,
    ) -> Self {
        Self {
            subject,
            organization_id,
            feature: feature.trim().to_ascii_lowercase(),
            permission: permission.trim().to_ascii_lowercase(),
        }
    }

    /// Prefix shared by every key of one subject inside one organization.
    #[must_use]
    pub fn subject_prefix(subject: UserProfileId, organization_id: OrganizationId) -> String {
        format!("{KEY_NAMESPACE}:{subject}:{organization_id}:")
    }

    /// Renders the storage key.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "{}{}:{}",
            Self::subject_prefix(self.subject, self.organization_id),
            self.feature,
            self.permission
        )
    }
}

/// Decision cache in front of the grant lookup.
#[derive(Clone)]
pub struct PermissionCache {
    store: Arc<dyn CacheStore>,
    ttl_seconds: u64,
}

impl PermissionCache {
    /// Creates a cache over a store with a fixed decision ttl.
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>, ttl_seconds: u64) -> Self {
        Self { store, ttl_seconds }
    }

    /// Returns the cached decision, if any.
    pub async fn get(&self, key: &PermissionCacheKey) -> AppResult<Option<bool>> {
        let value = self.store.get(&key.render()).await?;
        Ok(match value.as_deref() {
            Some(ALLOWED) => Some(true),
            Some(DENIED) => Some(false),
            // Unknown payloads are treated as a miss and overwritten on the next put.
            _ => None,
        })
    }

    /// Stores a decision for the configured ttl.
    pub async fn put(&self, key: &PermissionCacheKey, allowed: bool) -> AppResult<()> {
        let value = if allowed { ALLOWED } else { DENIED };
        self.store
            .set(&key.render(), value, self.ttl_seconds)
            .await
    }

    /// Removes exactly one cached decision.
    pub async fn invalidate(&self, key: &PermissionCacheKey) -> AppResult<()> {
        self.store.delete(&key.render()).await
    }

    /// Removes every cached decision of a subject in an organization.
    ///
    /// Scans the key space, so it is reserved for rare administrative changes.
    pub async fn invalidate_subject(
        &self,
        subject: UserProfileId,
        organization_id: OrganizationId,
    ) -> AppResult<usize> {
        let prefix = PermissionCacheKey::subject_prefix(subject, organization_id);
        let keys = self.store.scan_prefix(&prefix).await?;
        for key in &keys {
            self.store.delete(key).await?;
        }

        debug!(
            subject = %subject,
            organization_id = %organization_id,
            removed = keys.len(),
            "invalidated cached permission decisions"
        );
        Ok(keys.len())
    }
}
