use async_trait::async_trait;
use leasewell_application::{GrantRepository, Membership, RoleCatalogRepository, RoleMember};
use leasewell_core::{AppError, AppResult};
use leasewell_domain::{
    FeatureId, FeaturePermission, FeaturePermissionId, GrantKey, OrganizationId,
    OrganizationRole, OrganizationUser, OrganizationUserId, PermissionId, RoleFeaturePermission,
    RoleFeaturePermissionId, RoleId, UserProfileId,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

mod grants;
mod membership;

/// PostgreSQL-backed repository for roles, memberships and grants.
#[derive(Clone)]
pub struct PostgresRoleCatalogRepository {
    pool: PgPool,
}

impl PostgresRoleCatalogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    organization_id: Option<Uuid>,
    is_internal: bool,
}

impl From<RoleRow> for OrganizationRole {
    fn from(row: RoleRow) -> Self {
        Self {
            id: RoleId::from_uuid(row.id),
            name: row.name,
            organization_id: row.organization_id.map(OrganizationId::from_uuid),
            is_internal: row.is_internal,
        }
    }
}

#[derive(Debug, FromRow)]
struct OrganizationUserRow {
    id: Uuid,
    profile_id: Uuid,
    organization_id: Uuid,
    role_id: Uuid,
    is_active: bool,
}

impl From<OrganizationUserRow> for OrganizationUser {
    fn from(row: OrganizationUserRow) -> Self {
        Self {
            id: OrganizationUserId::from_uuid(row.id),
            profile_id: UserProfileId::from_uuid(row.profile_id),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            role_id: RoleId::from_uuid(row.role_id),
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, FromRow)]
struct GrantRow {
    id: Uuid,
    role_id: Uuid,
    feature_id: Uuid,
    permission_id: Uuid,
    feature_permission_id: Uuid,
}

impl From<GrantRow> for RoleFeaturePermission {
    fn from(row: GrantRow) -> Self {
        Self {
            id: RoleFeaturePermissionId::from_uuid(row.id),
            role_id: RoleId::from_uuid(row.role_id),
            feature_id: FeatureId::from_uuid(row.feature_id),
            permission_id: PermissionId::from_uuid(row.permission_id),
            feature_permission_id: FeaturePermissionId::from_uuid(row.feature_permission_id),
        }
    }
}

#[async_trait]
impl RoleCatalogRepository for PostgresRoleCatalogRepository {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<OrganizationRole>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, organization_id, is_internal
            FROM organization_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role '{role_id}': {error}")))?;

        Ok(row.map(OrganizationRole::from))
    }

    async fn find_role_by_name(
        &self,
        organization_id: OrganizationId,
        name: &str,
    ) -> AppResult<Option<OrganizationRole>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name, organization_id, is_internal
            FROM organization_roles
            WHERE lower(name) = lower($2)
                AND (organization_id = $1 OR organization_id IS NULL)
            ORDER BY organization_id IS NULL
            LIMIT 1
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role '{name}': {error}")))?;

        Ok(row.map(OrganizationRole::from))
    }

    async fn find_membership(
        &self,
        subject: UserProfileId,
        organization_id: OrganizationId,
    ) -> AppResult<Option<Membership>> {
        self.find_membership_impl(subject, organization_id).await
    }

    async fn find_organization_user(
        &self,
        organization_user_id: OrganizationUserId,
    ) -> AppResult<Option<OrganizationUser>> {
        self.find_organization_user_impl(organization_user_id).await
    }

    async fn list_role_members(&self, role_id: RoleId) -> AppResult<Vec<RoleMember>> {
        self.list_role_members_impl(role_id).await
    }

    async fn insert_grant(
        &self,
        role_id: RoleId,
        feature_permission: &FeaturePermission,
    ) -> AppResult<RoleFeaturePermission> {
        self.insert_grant_impl(role_id, feature_permission).await
    }

    async fn delete_grant(&self, key: GrantKey) -> AppResult<bool> {
        self.delete_grant_impl(key).await
    }

    async fn rebind_member_role(
        &self,
        organization_user_id: OrganizationUserId,
        role_id: RoleId,
    ) -> AppResult<OrganizationUser> {
        self.rebind_member_role_impl(organization_user_id, role_id)
            .await
    }
}

#[async_trait]
impl GrantRepository for PostgresRoleCatalogRepository {
    async fn find_grants(&self, keys: &[GrantKey]) -> AppResult<Vec<RoleFeaturePermission>> {
        self.find_grants_impl(keys).await
    }
}
