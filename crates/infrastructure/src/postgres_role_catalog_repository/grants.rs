use super::*;

impl PostgresRoleCatalogRepository {
    /// One round trip for any number of keys, joined against the unnested key columns.
    pub(super) async fn find_grants_impl(
        &self,
        keys: &[GrantKey],
    ) -> AppResult<Vec<RoleFeaturePermission>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let role_ids: Vec<Uuid> = keys.iter().map(|key| key.role_id.as_uuid()).collect();
        let feature_ids: Vec<Uuid> = keys.iter().map(|key| key.feature_id.as_uuid()).collect();
        let permission_ids: Vec<Uuid> =
            keys.iter().map(|key| key.permission_id.as_uuid()).collect();

        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT
                grants.id,
                grants.role_id,
                grants.feature_id,
                grants.permission_id,
                grants.feature_permission_id
            FROM role_feature_permissions AS grants
            INNER JOIN UNNEST($1::uuid[], $2::uuid[], $3::uuid[])
                AS requested (role_id, feature_id, permission_id)
                ON grants.role_id = requested.role_id
                AND grants.feature_id = requested.feature_id
                AND grants.permission_id = requested.permission_id
            "#,
        )
        .bind(role_ids)
        .bind(feature_ids)
        .bind(permission_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role grants: {error}")))?;

        Ok(rows.into_iter().map(RoleFeaturePermission::from).collect())
    }

    pub(super) async fn insert_grant_impl(
        &self,
        role_id: RoleId,
        feature_permission: &FeaturePermission,
    ) -> AppResult<RoleFeaturePermission> {
        let row = sqlx::query_as::<_, GrantRow>(
            r#"
            INSERT INTO role_feature_permissions (
                id, role_id, feature_id, permission_id, feature_permission_id
            )
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (role_id, feature_id, permission_id)
            DO UPDATE SET feature_permission_id = EXCLUDED.feature_permission_id
            RETURNING id, role_id, feature_id, permission_id, feature_permission_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(role_id.as_uuid())
        .bind(feature_permission.feature_id.as_uuid())
        .bind(feature_permission.permission_id.as_uuid())
        .bind(feature_permission.id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to grant '{}' to role '{role_id}': {error}",
                feature_permission.description
            ))
        })?;

        Ok(RoleFeaturePermission::from(row))
    }

    pub(super) async fn delete_grant_impl(&self, key: GrantKey) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM role_feature_permissions
            WHERE role_id = $1 AND feature_id = $2 AND permission_id = $3
            "#,
        )
        .bind(key.role_id.as_uuid())
        .bind(key.feature_id.as_uuid())
        .bind(key.permission_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to revoke grant from role '{}': {error}",
                key.role_id
            ))
        })?;

        Ok(result.rows_affected() > 0)
    }
}
