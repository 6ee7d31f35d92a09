use chrono::{DateTime, Utc};
use leasewell_application::ProvisioningReceipt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Incoming payload for organization onboarding.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRequest {
    pub organization_name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub settings: Option<Value>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// Incoming payload for a member invitation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteMemberRequest {
    #[serde(default)]
    pub role_id: Option<Uuid>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub password: Option<String>,
}

/// Result of a completed provisioning run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningResponse {
    pub run_id: Uuid,
    pub account_id: String,
    pub organization_id: String,
    pub tenant_id: String,
    pub user_profile_id: String,
    pub organization_user_id: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_expires_at: Option<DateTime<Utc>>,
    pub states: Vec<&'static str>,
}

impl From<ProvisioningReceipt> for ProvisioningResponse {
    fn from(value: ProvisioningReceipt) -> Self {
        Self {
            run_id: value.run.run_id(),
            account_id: value.account_id,
            organization_id: value.graph.organization.id.to_string(),
            tenant_id: value.graph.organization.tenant_id,
            user_profile_id: value.graph.user_profile.id.to_string(),
            organization_user_id: value.graph.organization_user.id.to_string(),
            role: value.graph.role.name,
            invitation_id: value
                .graph
                .invitation
                .map(|invitation| invitation.id.to_string()),
            session_token: value.session.as_ref().map(|session| session.token.clone()),
            session_expires_at: value.session.map(|session| session.expires_at),
            states: value
                .run
                .journal()
                .iter()
                .map(|state| state.as_str())
                .collect(),
        }
    }
}
