use super::*;

impl PostgresOrganizationGraphRepository {
    /// Deletes child rows first; every statement tolerates rows that are already gone.
    pub(super) async fn remove_graph_impl(&self, graph: &OrganizationGraph) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        if let Some(invitation) = &graph.invitation {
            sqlx::query("DELETE FROM invitations WHERE id = $1")
                .bind(invitation.id.as_uuid())
                .execute(&mut *transaction)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to delete invitation: {error}"))
                })?;
        }

        sqlx::query("DELETE FROM organization_users WHERE id = $1")
            .bind(graph.organization_user.id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete organization user: {error}"))
            })?;

        sqlx::query("DELETE FROM user_profiles WHERE id = $1")
            .bind(graph.user_profile.id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete user profile: {error}"))
            })?;

        if graph.organization_created {
            sqlx::query("DELETE FROM organizations WHERE id = $1")
                .bind(graph.organization.id.as_uuid())
                .execute(&mut *transaction)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to delete organization: {error}"))
                })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }
}
