//! Strongly typed row identifiers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID value.
            #[must_use]
            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Returns the underlying UUID value.
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a tenant organization.
    OrganizationId
);
uuid_id!(
    /// Identifier of a user profile (the claims `subjectProfileId`).
    UserProfileId
);
uuid_id!(
    /// Identifier of an organization membership row.
    OrganizationUserId
);
uuid_id!(
    /// Identifier of an organization role.
    RoleId
);
uuid_id!(
    /// Identifier of a feature reference row.
    FeatureId
);
uuid_id!(
    /// Identifier of a permission reference row.
    PermissionId
);
uuid_id!(
    /// Identifier of a feature/permission pairing.
    FeaturePermissionId
);
uuid_id!(
    /// Identifier of a role grant row.
    RoleFeaturePermissionId
);
uuid_id!(
    /// Identifier of a pending member invitation.
    InvitationId
);

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{OrganizationId, RoleId};

    #[test]
    fn ids_round_trip_their_uuid() {
        let value = Uuid::new_v4();
        assert_eq!(OrganizationId::from_uuid(value).as_uuid(), value);
        assert_eq!(RoleId::from_uuid(value).to_string(), value.to_string());
    }

    #[test]
    fn ids_serialize_as_bare_uuid() {
        let value = Uuid::new_v4();
        let encoded = serde_json::to_string(&OrganizationId::from_uuid(value)).unwrap_or_default();
        assert_eq!(encoded, format!("\"{value}\""));
    }
}
