//! Role, feature and permission reference data.

use serde::{Deserialize, Serialize};

use crate::{
    FeatureId, FeaturePermissionId, OrganizationId, PermissionId, RoleFeaturePermissionId, RoleId,
};

/// Named role a membership is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRole {
    /// Row identifier.
    pub id: RoleId,
    /// Role name, e.g. `owner`.
    pub name: String,
    /// Owning organization, `None` for system-wide roles.
    pub organization_id: Option<OrganizationId>,
    /// Reserved for internal staff, never assignable by tenants.
    pub is_internal: bool,
}

impl OrganizationRole {
    /// Returns whether the role can be bound inside the given organization.
    #[must_use]
    pub fn is_assignable_in(&self, organization_id: OrganizationId) -> bool {
        !self.is_internal
            && self
                .organization_id
                .is_none_or(|owner| owner == organization_id)
    }
}

/// Feature vocabulary row, e.g. `Lease`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    /// Row identifier.
    pub id: FeatureId,
    /// Unique feature name.
    pub name: String,
}

/// Permission vocabulary row, e.g. `Write`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Row identifier.
    pub id: PermissionId,
    /// Unique permission name.
    pub name: String,
}

/// Named pairing of one feature and one permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturePermission {
    /// Row identifier.
    pub id: FeaturePermissionId,
    /// Paired feature.
    pub feature_id: FeatureId,
    /// Paired permission.
    pub permission_id: PermissionId,
    /// Human-readable description, e.g. `Lease:Write`.
    pub description: String,
}

/// Grant of one feature permission to one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleFeaturePermission {
    /// Row identifier.
    pub id: RoleFeaturePermissionId,
    /// Granted role.
    pub role_id: RoleId,
    /// Granted feature.
    pub feature_id: FeatureId,
    /// Granted permission.
    pub permission_id: PermissionId,
    /// Pairing row the grant refers to.
    pub feature_permission_id: FeaturePermissionId,
}

impl RoleFeaturePermission {
    /// Returns the lookup key of this grant.
    #[must_use]
    pub fn key(&self) -> GrantKey {
        GrantKey {
            role_id: self.role_id,
            feature_id: self.feature_id,
            permission_id: self.permission_id,
        }
    }
}

/// Lookup key mapping to at most one grant row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GrantKey {
    /// Role being checked.
    pub role_id: RoleId,
    /// Feature being checked.
    pub feature_id: FeatureId,
    /// Permission being checked.
    pub permission_id: PermissionId,
}
