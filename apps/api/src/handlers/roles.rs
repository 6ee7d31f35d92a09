use axum::Json;
use axum::extract::{Extension, Path, State};
use leasewell_core::RequestContext;
use leasewell_domain::{OrganizationUserId, RoleId};
use uuid::Uuid;

use crate::dto::{
    ChangeMemberRoleRequest, GrantRequest, GrantResponse, OrganizationUserResponse,
    RevokeGrantResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn grant_permission_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<GrantRequest>,
) -> ApiResult<Json<GrantResponse>> {
    let grant = state
        .role_catalog_service
        .grant(
            &ctx,
            RoleId::from_uuid(role_id),
            payload.feature.as_str(),
            payload.permission.as_str(),
        )
        .await?;

    Ok(Json(GrantResponse::from(grant)))
}

pub async fn revoke_permission_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<GrantRequest>,
) -> ApiResult<Json<RevokeGrantResponse>> {
    let removed = state
        .role_catalog_service
        .revoke(
            &ctx,
            RoleId::from_uuid(role_id),
            payload.feature.as_str(),
            payload.permission.as_str(),
        )
        .await?;

    Ok(Json(RevokeGrantResponse { removed }))
}

pub async fn change_member_role_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(organization_user_id): Path<Uuid>,
    Json(payload): Json<ChangeMemberRoleRequest>,
) -> ApiResult<Json<OrganizationUserResponse>> {
    let membership = state
        .role_catalog_service
        .change_member_role(
            &ctx,
            OrganizationUserId::from_uuid(organization_user_id),
            payload.role_name.as_str(),
        )
        .await?;

    Ok(Json(OrganizationUserResponse::from(membership)))
}
