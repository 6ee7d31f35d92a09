//! The `has_permission` façade every privileged operation consults.
//!
//! Resolution order: decision cache, then subject membership and role,
//! feature and permission by name, then the grant row through a request-scoped
//! [`GrantBatchLoader`]. Any infrastructure failure denies (fail-closed).
//!
//! Only answers about a known membership, feature and permission are cached;
//! names that resolve to nothing are denied on every call without an entry.

use std::sync::Arc;

use futures::future::join_all;
use leasewell_core::{AppError, AppResult, RequestContext};
use leasewell_domain::{GrantKey, OrganizationId, UserProfileId};
use tracing::{debug, warn};

use crate::{
    GrantBatchLoader, GrantRepository, PermissionCache, PermissionCacheKey,
    PermissionCatalogRepository, RoleCatalogRepository,
};

/// One authorization question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionCheck {
    /// Profile asking.
    pub subject: UserProfileId,
    /// Organization the action targets.
    pub organization_id: OrganizationId,
    /// Feature name, e.g. `Lease`.
    pub feature: String,
    /// Permission name, e.g. `Write`.
    pub permission: String,
}

impl PermissionCheck {
    /// Creates a check. Surrounding whitespace is dropped from both names.
    #[must_use]
    pub fn new(
        subject: UserProfileId,
        organization_id: OrganizationId,
        feature: impl Into<String>,
        permission: impl Into<String>,
    ) -> Self {
        Self {
            subject,
            organization_id,
            feature: feature.into().trim().to_owned(),
            permission: permission.into().trim().to_owned(),
        }
    }

    fn cache_key(&self) -> PermissionCacheKey {
        PermissionCacheKey::new(
            self.subject,
            self.organization_id,
            &self.feature,
            &self.permission,
        )
    }
}

enum Resolution {
    Decided(bool),
    Unresolved,
}

/// Cached, batched, fail-closed authorization checks.
#[derive(Clone)]
pub struct AuthorizationEngine {
    role_catalog: Arc<dyn RoleCatalogRepository>,
    permission_catalog: Arc<dyn PermissionCatalogRepository>,
    grant_repository: Arc<dyn GrantRepository>,
    cache: PermissionCache,
}

impl AuthorizationEngine {
    /// Creates an engine from its catalogs, grant store and decision cache.
    #[must_use]
    pub fn new(
        role_catalog: Arc<dyn RoleCatalogRepository>,
        permission_catalog: Arc<dyn PermissionCatalogRepository>,
        grant_repository: Arc<dyn GrantRepository>,
        cache: PermissionCache,
    ) -> Self {
        Self {
            role_catalog,
            permission_catalog,
            grant_repository,
            cache,
        }
    }

    /// Returns whether the subject may perform `permission` on `feature` in the organization.
    ///
    /// Never errors: a missing grant and an infrastructure failure both return `false`.
    pub async fn has_permission(
        &self,
        ctx: &RequestContext,
        subject: UserProfileId,
        organization_id: OrganizationId,
        feature: &str,
        permission: &str,
    ) -> bool {
        let check = PermissionCheck::new(subject, organization_id, feature, permission);
        let loader = GrantBatchLoader::new(self.grant_repository.clone());
        self.check_with_loader(ctx, &loader, &check).await
    }

    /// Answers many checks concurrently through one grant batch.
    ///
    /// Results line up with `checks` by position.
    pub async fn has_permissions(
        &self,
        ctx: &RequestContext,
        checks: &[PermissionCheck],
    ) -> Vec<bool> {
        let loader = GrantBatchLoader::new(self.grant_repository.clone());
        join_all(
            checks
                .iter()
                .map(|check| self.check_with_loader(ctx, &loader, check)),
        )
        .await
    }

    /// Like [`Self::has_permission`] but turns a denial into `AppError::Forbidden`.
    pub async fn require_permission(
        &self,
        ctx: &RequestContext,
        subject: UserProfileId,
        organization_id: OrganizationId,
        feature: &str,
        permission: &str,
    ) -> AppResult<()> {
        if self
            .has_permission(ctx, subject, organization_id, feature, permission)
            .await
        {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "subject '{subject}' may not '{permission}' on '{feature}' in organization '{organization_id}'"
        )))
    }

    /// Returns the decision cache so grant administration can invalidate it.
    #[must_use]
    pub fn cache(&self) -> &PermissionCache {
        &self.cache
    }

    async fn check_with_loader(
        &self,
        ctx: &RequestContext,
        loader: &GrantBatchLoader,
        check: &PermissionCheck,
    ) -> bool {
        let key = check.cache_key();

        match self.cache.get(&key).await {
            Ok(Some(allowed)) => return allowed,
            Ok(None) => {}
            Err(error) => warn!(
                request_id = %ctx.request_id(),
                error = %error,
                "permission cache read failed, falling through to store"
            ),
        }

        let allowed = match self.resolve(loader, check).await {
            Ok(Resolution::Decided(allowed)) => allowed,
            Ok(Resolution::Unresolved) => {
                debug!(
                    request_id = %ctx.request_id(),
                    subject = %check.subject,
                    feature = %check.feature,
                    permission = %check.permission,
                    "nothing to resolve, denying without caching"
                );
                return false;
            }
            Err(error) => {
                warn!(
                    request_id = %ctx.request_id(),
                    subject = %check.subject,
                    organization_id = %check.organization_id,
                    feature = %check.feature,
                    permission = %check.permission,
                    error = %error,
                    "authorization lookup failed, denying"
                );
                return false;
            }
        };

        if let Err(error) = self.cache.put(&key, allowed).await {
            warn!(
                request_id = %ctx.request_id(),
                error = %error,
                "permission cache write failed"
            );
        }

        debug!(
            request_id = %ctx.request_id(),
            subject = %check.subject,
            feature = %check.feature,
            permission = %check.permission,
            allowed,
            "resolved permission"
        );
        allowed
    }

    async fn resolve(
        &self,
        loader: &GrantBatchLoader,
        check: &PermissionCheck,
    ) -> AppResult<Resolution> {
        let Some(membership) = self
            .role_catalog
            .find_membership(check.subject, check.organization_id)
            .await?
        else {
            return Ok(Resolution::Unresolved);
        };

        if !membership.organization_user.is_active {
            return Ok(Resolution::Decided(false));
        }

        let Some(feature) = self
            .permission_catalog
            .find_feature_by_name(&check.feature)
            .await?
        else {
            return Ok(Resolution::Unresolved);
        };

        let Some(permission) = self
            .permission_catalog
            .find_permission_by_name(&check.permission)
            .await?
        else {
            return Ok(Resolution::Unresolved);
        };

        let grant = loader
            .load(GrantKey {
                role_id: membership.role.id,
                feature_id: feature.id,
                permission_id: permission.id,
            })
            .await?;

        Ok(Resolution::Decided(grant.is_some()))
    }
}

#[cfg(test)]
mod tests;
