use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use leasewell_application::{InviteMemberInput, OnboardOrganizationInput};
use leasewell_core::RequestContext;
use leasewell_domain::{OrganizationId, RoleId};
use uuid::Uuid;

use crate::dto::{InviteMemberRequest, OnboardingRequest, ProvisioningResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn onboarding_handler(
    State(state): State<AppState>,
    Json(payload): Json<OnboardingRequest>,
) -> ApiResult<(StatusCode, Json<ProvisioningResponse>)> {
    let ctx = RequestContext::anonymous();
    let receipt = state
        .provisioning_saga
        .onboard_organization(
            &ctx,
            &state.owner_onboarding,
            OnboardOrganizationInput {
                organization_name: payload.organization_name,
                country: payload.country,
                settings: payload.settings,
                email: payload.email,
                first_name: payload.first_name,
                last_name: payload.last_name,
                secret: payload.password,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ProvisioningResponse::from(receipt))))
}

pub async fn invite_member_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(organization_id): Path<Uuid>,
    Json(payload): Json<InviteMemberRequest>,
) -> ApiResult<(StatusCode, Json<ProvisioningResponse>)> {
    let receipt = state
        .provisioning_saga
        .invite_member(
            &ctx,
            &state.member_invitation,
            InviteMemberInput {
                organization_id: OrganizationId::from_uuid(organization_id),
                role_id: payload.role_id.map(RoleId::from_uuid),
                email: payload.email,
                first_name: payload.first_name,
                last_name: payload.last_name,
                secret: payload.password,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ProvisioningResponse::from(receipt))))
}
