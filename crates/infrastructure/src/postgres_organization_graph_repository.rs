use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leasewell_application::{
    GraphPlan, OrganizationGraph, OrganizationGraphRepository, OrganizationPlan,
};
use leasewell_core::{AppError, AppResult};
use leasewell_domain::{Organization, OrganizationId};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

mod persist;
mod remove;

/// PostgreSQL-backed repository for the provisioning row graph.
#[derive(Clone)]
pub struct PostgresOrganizationGraphRepository {
    pool: PgPool,
}

impl PostgresOrganizationGraphRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct OrganizationRow {
    id: Uuid,
    tenant_id: String,
    name: String,
    country: Option<String>,
    settings: Value,
    csrf_secret: String,
    is_active: bool,
    is_deleted: bool,
    created_at: DateTime<Utc>,
}

impl From<OrganizationRow> for Organization {
    fn from(row: OrganizationRow) -> Self {
        Self {
            id: OrganizationId::from_uuid(row.id),
            tenant_id: row.tenant_id,
            name: row.name,
            country: row.country,
            settings: row.settings,
            csrf_secret: row.csrf_secret,
            is_active: row.is_active,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl OrganizationGraphRepository for PostgresOrganizationGraphRepository {
    async fn find_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Option<Organization>> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT id, tenant_id, name, country, settings, csrf_secret, is_active, is_deleted, created_at
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(organization_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load organization '{organization_id}': {error}"
            ))
        })?;

        Ok(row.map(Organization::from))
    }

    async fn persist_graph(&self, plan: GraphPlan) -> AppResult<OrganizationGraph> {
        self.persist_graph_impl(plan).await
    }

    async fn remove_graph(&self, graph: &OrganizationGraph) -> AppResult<()> {
        self.remove_graph_impl(graph).await
    }
}

/// Maps unique violations to `Conflict` and everything else to `Internal`.
fn map_write_error(error: sqlx::Error, conflict: impl FnOnce() -> String, context: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(conflict());
    }

    AppError::Internal(format!("{context}: {error}"))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use leasewell_domain::Organization;
    use serde_json::json;
    use uuid::Uuid;

    use super::OrganizationRow;

    #[test]
    fn organization_row_maps_every_column() {
        let id = Uuid::new_v4();
        let row = OrganizationRow {
            id,
            tenant_id: "acme-llc-0a1b2c3d".to_owned(),
            name: "Acme LLC".to_owned(),
            country: Some("US".to_owned()),
            settings: json!({"currency": "USD"}),
            csrf_secret: "secret".to_owned(),
            is_active: true,
            is_deleted: false,
            created_at: Utc::now(),
        };

        let organization = Organization::from(row);

        assert_eq!(organization.id.as_uuid(), id);
        assert_eq!(organization.settings["currency"], "USD");
        assert!(organization.is_active);
    }
}
