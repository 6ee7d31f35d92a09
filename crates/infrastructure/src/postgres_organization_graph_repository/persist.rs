use super::*;

impl PostgresOrganizationGraphRepository {
    pub(super) async fn persist_graph_impl(&self, plan: GraphPlan) -> AppResult<OrganizationGraph> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let (organization, organization_created) = match plan.organization {
            OrganizationPlan::Create(organization) => {
                sqlx::query(
                    r#"
                    INSERT INTO organizations (
                        id, tenant_id, name, country, settings, csrf_secret, is_active, is_deleted, created_at
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    "#,
                )
                .bind(organization.id.as_uuid())
                .bind(organization.tenant_id.as_str())
                .bind(organization.name.as_str())
                .bind(organization.country.as_deref())
                .bind(&organization.settings)
                .bind(organization.csrf_secret.as_str())
                .bind(organization.is_active)
                .bind(organization.is_deleted)
                .bind(organization.created_at)
                .execute(&mut *transaction)
                .await
                .map_err(|error| {
                    map_write_error(
                        error,
                        || format!("organization '{}' already exists", organization.name),
                        "failed to create organization",
                    )
                })?;

                (organization, true)
            }
            OrganizationPlan::Existing(organization_id) => {
                // Lock the row so a concurrent soft delete cannot slip in before commit.
                let organization = sqlx::query_as::<_, OrganizationRow>(
                    r#"
                    SELECT id, tenant_id, name, country, settings, csrf_secret, is_active, is_deleted, created_at
                    FROM organizations
                    WHERE id = $1 AND is_active AND NOT is_deleted
                    FOR SHARE
                    "#,
                )
                .bind(organization_id.as_uuid())
                .fetch_optional(&mut *transaction)
                .await
                .map_err(|error| {
                    AppError::Internal(format!(
                        "failed to lock organization '{organization_id}': {error}"
                    ))
                })?
                .map(Organization::from)
                .ok_or_else(|| {
                    AppError::NotFound(format!("organization '{organization_id}' does not exist"))
                })?;

                (organization, false)
            }
        };

        let profile = &plan.user_profile;
        sqlx::query(
            r#"
            INSERT INTO user_profiles (id, account_id, email, first_name, last_name, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(profile.id.as_uuid())
        .bind(profile.account_id.as_str())
        .bind(profile.email.as_str())
        .bind(profile.first_name.as_str())
        .bind(profile.last_name.as_str())
        .bind(profile.created_at)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            map_write_error(
                error,
                || format!("account '{}' already has a profile", profile.account_id),
                "failed to create user profile",
            )
        })?;

        let membership = &plan.organization_user;
        sqlx::query(
            r#"
            INSERT INTO organization_users (id, profile_id, organization_id, role_id, is_active)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(membership.id.as_uuid())
        .bind(membership.profile_id.as_uuid())
        .bind(membership.organization_id.as_uuid())
        .bind(membership.role_id.as_uuid())
        .bind(membership.is_active)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            map_write_error(
                error,
                || "profile is already an active member of the organization".to_owned(),
                "failed to create organization user",
            )
        })?;

        if let Some(invitation) = &plan.invitation {
            sqlx::query(
                r#"
                INSERT INTO invitations (
                    id, organization_id, email, first_name, last_name, role_id,
                    invited_by, token_hash, status, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(invitation.id.as_uuid())
            .bind(invitation.organization_id.as_uuid())
            .bind(invitation.email.as_str())
            .bind(invitation.first_name.as_str())
            .bind(invitation.last_name.as_str())
            .bind(invitation.role_id.as_uuid())
            .bind(invitation.invited_by.map(|profile_id| profile_id.as_uuid()))
            .bind(invitation.token_hash.as_str())
            .bind(invitation.status.as_str())
            .bind(invitation.created_at)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                map_write_error(
                    error,
                    || format!("invitation for '{}' already exists", invitation.email),
                    "failed to create invitation",
                )
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(OrganizationGraph {
            organization,
            organization_user: plan.organization_user,
            user_profile: plan.user_profile,
            role: plan.role,
            invitation: plan.invitation,
            organization_created,
        })
    }
}
