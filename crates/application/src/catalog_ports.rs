use async_trait::async_trait;
use leasewell_core::AppResult;
use leasewell_domain::{
    Feature, FeatureId, FeaturePermission, GrantKey, OrganizationId, OrganizationRole,
    OrganizationUser, OrganizationUserId, Permission, PermissionId, RoleFeaturePermission, RoleId,
    UserProfileId,
};

/// Membership row resolved together with its bound role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    /// Active membership row.
    pub organization_user: OrganizationUser,
    /// Role the membership is bound to.
    pub role: OrganizationRole,
}

/// Member currently holding a role, used to target cache invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoleMember {
    /// Member profile.
    pub profile_id: UserProfileId,
    /// Organization of the membership.
    pub organization_id: OrganizationId,
}

/// Read port over the feature and permission vocabularies.
///
/// Name lookups are case-insensitive.
#[async_trait]
pub trait PermissionCatalogRepository: Send + Sync {
    /// Finds a feature by name.
    async fn find_feature_by_name(&self, name: &str) -> AppResult<Option<Feature>>;

    /// Finds a permission by name.
    async fn find_permission_by_name(&self, name: &str) -> AppResult<Option<Permission>>;

    /// Finds the pairing row for a feature and permission.
    async fn find_feature_permission(
        &self,
        feature_id: FeatureId,
        permission_id: PermissionId,
    ) -> AppResult<Option<FeaturePermission>>;
}

/// Port over organization roles, memberships and role grants.
#[async_trait]
pub trait RoleCatalogRepository: Send + Sync {
    /// Finds a role by id.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<OrganizationRole>>;

    /// Finds a role by name, preferring an organization-scoped role over a
    /// system-wide role of the same name.
    async fn find_role_by_name(
        &self,
        organization_id: OrganizationId,
        name: &str,
    ) -> AppResult<Option<OrganizationRole>>;

    /// Resolves the active membership of a subject in an organization.
    async fn find_membership(
        &self,
        subject: UserProfileId,
        organization_id: OrganizationId,
    ) -> AppResult<Option<Membership>>;

    /// Finds a membership row by id.
    async fn find_organization_user(
        &self,
        organization_user_id: OrganizationUserId,
    ) -> AppResult<Option<OrganizationUser>>;

    /// Lists active members bound to a role.
    async fn list_role_members(&self, role_id: RoleId) -> AppResult<Vec<RoleMember>>;

    /// Grants a feature permission to a role. Granting twice returns the existing row.
    async fn insert_grant(
        &self,
        role_id: RoleId,
        feature_permission: &FeaturePermission,
    ) -> AppResult<RoleFeaturePermission>;

    /// Deletes a grant. Returns whether a row was removed.
    async fn delete_grant(&self, key: GrantKey) -> AppResult<bool>;

    /// Binds a membership to another role.
    async fn rebind_member_role(
        &self,
        organization_user_id: OrganizationUserId,
        role_id: RoleId,
    ) -> AppResult<OrganizationUser>;
}

/// Bulk grant lookup used by the batching loader.
#[async_trait]
pub trait GrantRepository: Send + Sync {
    /// Returns the grant rows matching any of the keys, in any order, in one round trip.
    async fn find_grants(&self, keys: &[GrantKey]) -> AppResult<Vec<RoleFeaturePermission>>;
}
