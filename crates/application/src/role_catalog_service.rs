//! Grant administration. Every mutation invalidates the affected decisions.

use std::sync::Arc;

use leasewell_core::{AppError, AppResult, RequestContext};
use leasewell_domain::{
    Feature, FeaturePermission, GrantKey, OrganizationId, OrganizationRole, OrganizationUser,
    OrganizationUserId, Permission, RoleFeaturePermission, RoleId, UserProfileId,
};
use tracing::{error, info};

use crate::{
    AuthorizationEngine, PermissionCacheKey, PermissionCatalogRepository, RoleCatalogRepository,
};

/// Application service for role grants and member role bindings.
#[derive(Clone)]
pub struct RoleCatalogService {
    role_catalog: Arc<dyn RoleCatalogRepository>,
    permission_catalog: Arc<dyn PermissionCatalogRepository>,
    authorization_engine: AuthorizationEngine,
}

impl RoleCatalogService {
    /// Creates a new service.
    #[must_use]
    pub fn new(
        role_catalog: Arc<dyn RoleCatalogRepository>,
        permission_catalog: Arc<dyn PermissionCatalogRepository>,
        authorization_engine: AuthorizationEngine,
    ) -> Self {
        Self {
            role_catalog,
            permission_catalog,
            authorization_engine,
        }
    }

    /// Grants `permission` on `feature` to a role of the caller's organization.
    pub async fn grant(
        &self,
        ctx: &RequestContext,
        role_id: RoleId,
        feature_name: &str,
        permission_name: &str,
    ) -> AppResult<RoleFeaturePermission> {
        let organization_id = self.require_role_admin(ctx).await?;
        let role = self.editable_role(role_id, organization_id).await?;
        let (feature, permission, pair) = self.resolve_pair(feature_name, permission_name).await?;

        let grant = self.role_catalog.insert_grant(role.id, &pair).await?;
        self.invalidate_role(ctx, &role, &feature, &permission).await?;

        info!(
            request_id = %ctx.request_id(),
            role_id = %role.id,
            feature = %feature.name,
            permission = %permission.name,
            "granted permission"
        );
        Ok(grant)
    }

    /// Revokes a grant. Returns whether a row was removed.
    pub async fn revoke(
        &self,
        ctx: &RequestContext,
        role_id: RoleId,
        feature_name: &str,
        permission_name: &str,
    ) -> AppResult<bool> {
        let organization_id = self.require_role_admin(ctx).await?;
        let role = self.editable_role(role_id, organization_id).await?;
        let (feature, permission, _) = self.resolve_pair(feature_name, permission_name).await?;

        let removed = self
            .role_catalog
            .delete_grant(GrantKey {
                role_id: role.id,
                feature_id: feature.id,
                permission_id: permission.id,
            })
            .await?;
        self.invalidate_role(ctx, &role, &feature, &permission).await?;

        info!(
            request_id = %ctx.request_id(),
            role_id = %role.id,
            feature = %feature.name,
            permission = %permission.name,
            removed,
            "revoked permission"
        );
        Ok(removed)
    }

    /// Rebinds a membership to another role and clears that member's decisions.
    pub async fn change_member_role(
        &self,
        ctx: &RequestContext,
        organization_user_id: OrganizationUserId,
        role_name: &str,
    ) -> AppResult<OrganizationUser> {
        let organization_id = self.require_role_admin(ctx).await?;

        let membership = self
            .role_catalog
            .find_organization_user(organization_user_id)
            .await?
            .filter(|membership| membership.organization_id == organization_id)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "organization user '{organization_user_id}' does not exist"
                ))
            })?;

        let role = self
            .role_catalog
            .find_role_by_name(organization_id, role_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_name}' does not exist")))?;
        if !role.is_assignable_in(organization_id) {
            return Err(AppError::Validation(format!(
                "role '{}' cannot be assigned in this organization",
                role.name
            )));
        }

        let updated = self
            .role_catalog
            .rebind_member_role(membership.id, role.id)
            .await?;

        self.authorization_engine
            .cache()
            .invalidate_subject(updated.profile_id, organization_id)
            .await?;

        info!(
            request_id = %ctx.request_id(),
            organization_user_id = %updated.id,
            role = %role.name,
            "changed member role"
        );
        Ok(updated)
    }

    async fn require_role_admin(&self, ctx: &RequestContext) -> AppResult<OrganizationId> {
        let principal = ctx.require_principal()?;
        let organization_id = OrganizationId::from_uuid(principal.organization_id());
        self.authorization_engine
            .require_permission(
                ctx,
                UserProfileId::from_uuid(principal.subject_profile_id()),
                organization_id,
                "Role",
                "Write",
            )
            .await?;
        Ok(organization_id)
    }

    async fn editable_role(
        &self,
        role_id: RoleId,
        organization_id: OrganizationId,
    ) -> AppResult<OrganizationRole> {
        let role = self
            .role_catalog
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;

        if role.is_internal || role.organization_id != Some(organization_id) {
            return Err(AppError::Forbidden(format!(
                "role '{}' is not editable by this organization",
                role.name
            )));
        }
        Ok(role)
    }

    async fn resolve_pair(
        &self,
        feature_name: &str,
        permission_name: &str,
    ) -> AppResult<(Feature, Permission, FeaturePermission)> {
        let feature = self
            .permission_catalog
            .find_feature_by_name(feature_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("feature '{feature_name}' does not exist")))?;
        let permission = self
            .permission_catalog
            .find_permission_by_name(permission_name)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("permission '{permission_name}' does not exist"))
            })?;
        let pair = self
            .permission_catalog
            .find_feature_permission(feature.id, permission.id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "'{feature_name}' does not support '{permission_name}'"
                ))
            })?;

        Ok((feature, permission, pair))
    }

    /// Deletes the exact decision of every member holding the role.
    async fn invalidate_role(
        &self,
        ctx: &RequestContext,
        role: &OrganizationRole,
        feature: &Feature,
        permission: &Permission,
    ) -> AppResult<()> {
        let members = self.role_catalog.list_role_members(role.id).await?;
        let cache = self.authorization_engine.cache();

        let mut first_failure = None;
        for member in &members {
            let key = PermissionCacheKey::new(
                member.profile_id,
                member.organization_id,
                &feature.name,
                &permission.name,
            );
            if let Err(failure) = cache.invalidate(&key).await {
                error!(
                    request_id = %ctx.request_id(),
                    subject = %member.profile_id,
                    error = %failure,
                    "failed to invalidate cached decision"
                );
                first_failure.get_or_insert(failure);
            }
        }

        match first_failure {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}
