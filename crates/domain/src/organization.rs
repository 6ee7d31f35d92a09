//! Tenant organizations, memberships, profiles and invitations.

use chrono::{DateTime, Utc};
use leasewell_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::{InvitationId, OrganizationId, OrganizationUserId, RoleId, UserProfileId};

/// Maximum organization name length in characters.
const ORGANIZATION_NAME_MAX_LENGTH: usize = 120;

/// Validated organization display name.
///
/// Uniqueness among active organizations is case-insensitive, see
/// [`OrganizationName::uniqueness_key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizationName(NonEmptyString);

impl OrganizationName {
    /// Creates a validated organization name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = NonEmptyString::new(value)?;
        if value.as_str().chars().count() > ORGANIZATION_NAME_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "organization name must not exceed {ORGANIZATION_NAME_MAX_LENGTH} characters"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the name as entered (trimmed).
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the value the store's uniqueness constraint compares.
    #[must_use]
    pub fn uniqueness_key(&self) -> String {
        self.0.as_str().to_lowercase()
    }
}

/// Tenant root row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Row identifier.
    pub id: OrganizationId,
    /// Tenant id registered with the identity provider.
    pub tenant_id: String,
    /// Display name, unique among non-deleted rows.
    pub name: String,
    /// Optional ISO country code.
    pub country: Option<String>,
    /// Free-form organization settings.
    pub settings: serde_json::Value,
    /// Generated secret for cross-site-request protection.
    pub csrf_secret: String,
    /// Whether the organization is live.
    pub is_active: bool,
    /// Soft-delete marker.
    pub is_deleted: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Profile bound to one identity-provider account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Row identifier, also the `subjectProfileId` claim.
    pub id: UserProfileId,
    /// Identity-provider account id.
    pub account_id: String,
    /// Canonical email address.
    pub email: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Membership of a profile in an organization under exactly one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationUser {
    /// Row identifier.
    pub id: OrganizationUserId,
    /// Member profile.
    pub profile_id: UserProfileId,
    /// Organization joined.
    pub organization_id: OrganizationId,
    /// Bound role.
    pub role_id: RoleId,
    /// At most one active row exists per (profile, organization).
    pub is_active: bool,
}

/// Lifecycle of a member invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    /// Sent, not yet accepted.
    Pending,
    /// Accepted by the invitee.
    Accepted,
    /// Withdrawn by an administrator.
    Revoked,
}

impl InvitationStatus {
    /// Returns the storage string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Revoked => "revoked",
        }
    }

    /// Parses a storage string.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "revoked" => Ok(Self::Revoked),
            _ => Err(AppError::Validation(format!(
                "unknown invitation status '{value}'"
            ))),
        }
    }
}

/// Invitation recorded when a member is provisioned by an inviter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    /// Row identifier.
    pub id: InvitationId,
    /// Organization the invitee joins.
    pub organization_id: OrganizationId,
    /// Invitee email.
    pub email: String,
    /// Invitee first name.
    pub first_name: String,
    /// Invitee last name.
    pub last_name: String,
    /// Role the invitee is bound to.
    pub role_id: RoleId,
    /// Profile of the inviter, if known.
    pub invited_by: Option<UserProfileId>,
    /// SHA-256 hex digest of the invitation token.
    pub token_hash: String,
    /// Current status.
    pub status: InvitationStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{InvitationStatus, OrganizationName};

    #[test]
    fn organization_name_uniqueness_ignores_case() {
        let left = OrganizationName::new("Acme LLC").map(|name| name.uniqueness_key());
        let right = OrganizationName::new("  ACME llc").map(|name| name.uniqueness_key());
        assert_eq!(left.ok(), right.ok());
    }

    #[test]
    fn overlong_organization_name_is_rejected() {
        assert!(OrganizationName::new("x".repeat(121)).is_err());
    }

    #[test]
    fn invitation_status_parses_storage_values() {
        for status in [
            InvitationStatus::Pending,
            InvitationStatus::Accepted,
            InvitationStatus::Revoked,
        ] {
            assert_eq!(InvitationStatus::parse(status.as_str()).ok(), Some(status));
        }
        assert!(InvitationStatus::parse("expired").is_err());
    }

    proptest! {
        #[test]
        fn uniqueness_key_is_lowercase(name in "[A-Za-z][A-Za-z ]{0,40}") {
            let parsed = OrganizationName::new(name);
            prop_assert!(parsed.is_ok());
            if let Ok(parsed) = parsed {
                let key = parsed.uniqueness_key();
                prop_assert_eq!(key.clone(), key.to_lowercase());
            }
        }
    }
}
