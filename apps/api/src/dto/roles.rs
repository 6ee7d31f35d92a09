use leasewell_domain::{OrganizationUser, RoleFeaturePermission};
use serde::{Deserialize, Serialize};

/// Incoming payload for granting or revoking a feature permission.
#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    pub feature: String,
    pub permission: String,
}

/// API representation of a role grant.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantResponse {
    pub grant_id: String,
    pub role_id: String,
    pub feature_id: String,
    pub permission_id: String,
}

impl From<RoleFeaturePermission> for GrantResponse {
    fn from(value: RoleFeaturePermission) -> Self {
        Self {
            grant_id: value.id.to_string(),
            role_id: value.role_id.to_string(),
            feature_id: value.feature_id.to_string(),
            permission_id: value.permission_id.to_string(),
        }
    }
}

/// Outcome of a revoke.
#[derive(Debug, Serialize)]
pub struct RevokeGrantResponse {
    pub removed: bool,
}

/// Incoming payload for rebinding a member to another role.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeMemberRoleRequest {
    pub role_name: String,
}

/// API representation of an organization membership.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationUserResponse {
    pub organization_user_id: String,
    pub profile_id: String,
    pub organization_id: String,
    pub role_id: String,
    pub is_active: bool,
}

impl From<OrganizationUser> for OrganizationUserResponse {
    fn from(value: OrganizationUser) -> Self {
        Self {
            organization_user_id: value.id.to_string(),
            profile_id: value.profile_id.to_string(),
            organization_id: value.organization_id.to_string(),
            role_id: value.role_id.to_string(),
            is_active: value.is_active,
        }
    }
}
