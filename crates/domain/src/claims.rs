use leasewell_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{OrganizationId, UserProfileId};

/// Custom-claims payload attached to an identity account after provisioning.
///
/// Serialized with camelCase keys because downstream token consumers read
/// `subjectProfileId`, `organizationRole`, `organizationId` and `tenantId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomClaims {
    /// Profile the account acts as.
    pub subject_profile_id: UserProfileId,
    /// Role name bound to the membership.
    pub organization_role: String,
    /// Organization of the membership.
    pub organization_id: OrganizationId,
    /// External tenant id of the organization.
    pub tenant_id: String,
}

impl CustomClaims {
    /// Converts the claims into the opaque map the identity provider stores.
    pub fn to_map(&self) -> AppResult<Map<String, Value>> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(AppError::Internal(format!(
                "custom claims serialized to a non-object value: {other}"
            ))),
            Err(error) => Err(AppError::Internal(format!(
                "failed to serialize custom claims: {error}"
            ))),
        }
    }

    /// Decodes claims embedded in a verified token.
    pub fn from_map(map: &Map<String, Value>) -> AppResult<Self> {
        serde_json::from_value(Value::Object(map.clone())).map_err(|error| {
            AppError::Unauthorized(format!("token does not carry organization claims: {error}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value};

    use crate::{OrganizationId, UserProfileId};

    use super::CustomClaims;

    #[test]
    fn claims_use_camel_case_keys() {
        let claims = CustomClaims {
            subject_profile_id: UserProfileId::new(),
            organization_role: "owner".to_owned(),
            organization_id: OrganizationId::new(),
            tenant_id: "acme-llc-4f1c".to_owned(),
        };

        let map = claims.to_map().unwrap_or_default();
        let mut keys = map.keys().cloned().collect::<Vec<_>>();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "organizationId",
                "organizationRole",
                "subjectProfileId",
                "tenantId"
            ]
        );
        assert_eq!(CustomClaims::from_map(&map).ok(), Some(claims));
    }

    #[test]
    fn missing_claims_are_unauthorized() {
        let mut map = Map::new();
        map.insert("email".to_owned(), Value::String("a@acme.com".to_owned()));
        assert!(matches!(
            CustomClaims::from_map(&map),
            Err(leasewell_core::AppError::Unauthorized(_))
        ));
    }
}
