//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod account;
mod authorization;
mod claims;
mod ids;
mod organization;

pub use account::{
    EmailAddress, PersonName, SECRET_MAX_LENGTH, SECRET_MIN_LENGTH, validate_account_secret,
};
pub use authorization::{
    Feature, FeaturePermission, GrantKey, OrganizationRole, Permission, RoleFeaturePermission,
};
pub use claims::CustomClaims;
pub use ids::{
    FeatureId, FeaturePermissionId, InvitationId, OrganizationId, OrganizationUserId,
    PermissionId, RoleFeaturePermissionId, RoleId, UserProfileId,
};
pub use organization::{
    Invitation, InvitationStatus, Organization, OrganizationName, OrganizationUser, UserProfile,
};
