mod authorization;
mod common;
mod provisioning;
mod roles;

pub use authorization::{
    AuthorizationCheckItem, AuthorizationCheckRequest, AuthorizationCheckResponse,
    AuthorizationCheckResult,
};
pub use common::{HealthDependencyStatus, HealthResponse};
pub use provisioning::{InviteMemberRequest, OnboardingRequest, ProvisioningResponse};
pub use roles::{
    ChangeMemberRoleRequest, GrantRequest, GrantResponse, OrganizationUserResponse,
    RevokeGrantResponse,
};
