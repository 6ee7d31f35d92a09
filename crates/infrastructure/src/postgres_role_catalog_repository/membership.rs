use super::*;

#[derive(Debug, FromRow)]
struct MembershipRow {
    id: Uuid,
    profile_id: Uuid,
    organization_id: Uuid,
    role_id: Uuid,
    is_active: bool,
    role_name: String,
    role_organization_id: Option<Uuid>,
    role_is_internal: bool,
}

#[derive(Debug, FromRow)]
struct RoleMemberRow {
    profile_id: Uuid,
    organization_id: Uuid,
}

impl PostgresRoleCatalogRepository {
    pub(super) async fn find_membership_impl(
        &self,
        subject: UserProfileId,
        organization_id: OrganizationId,
    ) -> AppResult<Option<Membership>> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT
                users.id,
                users.profile_id,
                users.organization_id,
                users.role_id,
                users.is_active,
                roles.name AS role_name,
                roles.organization_id AS role_organization_id,
                roles.is_internal AS role_is_internal
            FROM organization_users AS users
            INNER JOIN organization_roles AS roles
                ON roles.id = users.role_id
            WHERE users.profile_id = $1
                AND users.organization_id = $2
                AND users.is_active
            "#,
        )
        .bind(subject.as_uuid())
        .bind(organization_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to resolve membership of '{subject}' in '{organization_id}': {error}"
            ))
        })?;

        Ok(row.map(|row| Membership {
            organization_user: OrganizationUser {
                id: OrganizationUserId::from_uuid(row.id),
                profile_id: UserProfileId::from_uuid(row.profile_id),
                organization_id: OrganizationId::from_uuid(row.organization_id),
                role_id: RoleId::from_uuid(row.role_id),
                is_active: row.is_active,
            },
            role: OrganizationRole {
                id: RoleId::from_uuid(row.role_id),
                name: row.role_name,
                organization_id: row.role_organization_id.map(OrganizationId::from_uuid),
                is_internal: row.role_is_internal,
            },
        }))
    }

    pub(super) async fn find_organization_user_impl(
        &self,
        organization_user_id: OrganizationUserId,
    ) -> AppResult<Option<OrganizationUser>> {
        let row = sqlx::query_as::<_, OrganizationUserRow>(
            r#"
            SELECT id, profile_id, organization_id, role_id, is_active
            FROM organization_users
            WHERE id = $1
            "#,
        )
        .bind(organization_user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load organization user '{organization_user_id}': {error}"
            ))
        })?;

        Ok(row.map(OrganizationUser::from))
    }

    pub(super) async fn list_role_members_impl(
        &self,
        role_id: RoleId,
    ) -> AppResult<Vec<RoleMember>> {
        let rows = sqlx::query_as::<_, RoleMemberRow>(
            r#"
            SELECT profile_id, organization_id
            FROM organization_users
            WHERE role_id = $1 AND is_active
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list members of role '{role_id}': {error}"))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| RoleMember {
                profile_id: UserProfileId::from_uuid(row.profile_id),
                organization_id: OrganizationId::from_uuid(row.organization_id),
            })
            .collect())
    }

    pub(super) async fn rebind_member_role_impl(
        &self,
        organization_user_id: OrganizationUserId,
        role_id: RoleId,
    ) -> AppResult<OrganizationUser> {
        sqlx::query_as::<_, OrganizationUserRow>(
            r#"
            UPDATE organization_users
            SET role_id = $2
            WHERE id = $1
            RETURNING id, profile_id, organization_id, role_id, is_active
            "#,
        )
        .bind(organization_user_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to rebind organization user '{organization_user_id}': {error}"
            ))
        })?
        .map(OrganizationUser::from)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "organization user '{organization_user_id}' does not exist"
            ))
        })
    }
}
