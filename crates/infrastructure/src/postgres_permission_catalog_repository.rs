use async_trait::async_trait;
use leasewell_application::PermissionCatalogRepository;
use leasewell_core::{AppError, AppResult};
use leasewell_domain::{
    Feature, FeatureId, FeaturePermission, FeaturePermissionId, Permission, PermissionId,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL-backed repository for the feature and permission vocabularies.
#[derive(Clone)]
pub struct PostgresPermissionCatalogRepository {
    pool: PgPool,
}

impl PostgresPermissionCatalogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct NamedRow {
    id: Uuid,
    name: String,
}

#[derive(Debug, FromRow)]
struct FeaturePermissionRow {
    id: Uuid,
    feature_id: Uuid,
    permission_id: Uuid,
    description: String,
}

#[async_trait]
impl PermissionCatalogRepository for PostgresPermissionCatalogRepository {
    async fn find_feature_by_name(&self, name: &str) -> AppResult<Option<Feature>> {
        let row = sqlx::query_as::<_, NamedRow>(
            r#"
            SELECT id, name
            FROM features
            WHERE lower(name) = lower($1)
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve feature '{name}': {error}")))?;

        Ok(row.map(|row| Feature {
            id: FeatureId::from_uuid(row.id),
            name: row.name,
        }))
    }

    async fn find_permission_by_name(&self, name: &str) -> AppResult<Option<Permission>> {
        let row = sqlx::query_as::<_, NamedRow>(
            r#"
            SELECT id, name
            FROM permissions
            WHERE lower(name) = lower($1)
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to resolve permission '{name}': {error}"))
        })?;

        Ok(row.map(|row| Permission {
            id: PermissionId::from_uuid(row.id),
            name: row.name,
        }))
    }

    async fn find_feature_permission(
        &self,
        feature_id: FeatureId,
        permission_id: PermissionId,
    ) -> AppResult<Option<FeaturePermission>> {
        let row = sqlx::query_as::<_, FeaturePermissionRow>(
            r#"
            SELECT id, feature_id, permission_id, description
            FROM feature_permissions
            WHERE feature_id = $1 AND permission_id = $2
            "#,
        )
        .bind(feature_id.as_uuid())
        .bind(permission_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to resolve feature permission: {error}"))
        })?;

        Ok(row.map(|row| FeaturePermission {
            id: FeaturePermissionId::from_uuid(row.id),
            feature_id: FeatureId::from_uuid(row.feature_id),
            permission_id: PermissionId::from_uuid(row.permission_id),
            description: row.description,
        }))
    }
}
