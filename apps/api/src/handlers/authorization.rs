use axum::Json;
use axum::extract::{Extension, State};
use leasewell_application::PermissionCheck;
use leasewell_core::{AppError, AppResult, RequestContext};
use leasewell_domain::{OrganizationId, UserProfileId};

use crate::dto::{
    AuthorizationCheckItem, AuthorizationCheckRequest, AuthorizationCheckResponse,
    AuthorizationCheckResult,
};
use crate::error::ApiResult;
use crate::state::AppState;

const MAX_CHECKS_PER_REQUEST: usize = 100;

/// Answers the caller's checks against its own organization.
pub async fn check_permissions_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<AuthorizationCheckRequest>,
) -> ApiResult<Json<AuthorizationCheckResponse>> {
    let principal = ctx.require_principal()?;
    let subject = UserProfileId::from_uuid(principal.subject_profile_id());
    let organization_id = OrganizationId::from_uuid(principal.organization_id());

    let checks = build_checks(subject, organization_id, &payload.checks)?;

    let decisions = state.authorization_engine.has_permissions(&ctx, &checks).await;
    let results = payload
        .checks
        .into_iter()
        .zip(decisions)
        .map(|(check, allowed)| AuthorizationCheckResult { check, allowed })
        .collect();

    Ok(Json(AuthorizationCheckResponse { results }))
}

fn build_checks(
    subject: UserProfileId,
    organization_id: OrganizationId,
    items: &[AuthorizationCheckItem],
) -> AppResult<Vec<PermissionCheck>> {
    if items.len() > MAX_CHECKS_PER_REQUEST {
        return Err(AppError::Validation(format!(
            "at most {MAX_CHECKS_PER_REQUEST} checks are accepted per request, got {}",
            items.len()
        )));
    }

    Ok(items
        .iter()
        .map(|item| {
            PermissionCheck::new(
                subject,
                organization_id,
                item.feature.as_str(),
                item.permission.as_str(),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use leasewell_core::AppError;
    use leasewell_domain::{OrganizationId, UserProfileId};

    use super::{MAX_CHECKS_PER_REQUEST, build_checks};
    use crate::dto::AuthorizationCheckItem;

    fn items(count: usize) -> Vec<AuthorizationCheckItem> {
        (0..count)
            .map(|index| AuthorizationCheckItem {
                feature: format!("Feature{index}"),
                permission: " Read ".to_owned(),
            })
            .collect()
    }

    #[test]
    fn checks_up_to_the_limit_are_built_in_order() {
        let checks = build_checks(
            UserProfileId::new(),
            OrganizationId::new(),
            &items(MAX_CHECKS_PER_REQUEST),
        )
        .unwrap_or_default();

        assert_eq!(checks.len(), MAX_CHECKS_PER_REQUEST);
        assert_eq!(checks[0].feature, "Feature0");
        assert_eq!(checks[0].permission, "Read");
    }

    #[test]
    fn oversized_batches_are_rejected() {
        let result = build_checks(
            UserProfileId::new(),
            OrganizationId::new(),
            &items(MAX_CHECKS_PER_REQUEST + 1),
        );

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
