use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated caller derived from a verified bearer token and its custom claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    account_id: String,
    subject_profile_id: Uuid,
    organization_id: Uuid,
    organization_role: String,
    tenant_id: String,
}

impl Principal {
    /// Creates a principal from identity-provider and claim data.
    #[must_use]
    pub fn new(
        account_id: impl Into<String>,
        subject_profile_id: Uuid,
        organization_id: Uuid,
        organization_role: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            subject_profile_id,
            organization_id,
            organization_role: organization_role.into(),
            tenant_id: tenant_id.into(),
        }
    }

    /// Returns the identity-provider account id.
    #[must_use]
    pub fn account_id(&self) -> &str {
        self.account_id.as_str()
    }

    /// Returns the user profile the caller acts as.
    #[must_use]
    pub fn subject_profile_id(&self) -> Uuid {
        self.subject_profile_id
    }

    /// Returns the organization the token was issued for.
    #[must_use]
    pub fn organization_id(&self) -> Uuid {
        self.organization_id
    }

    /// Returns the role name embedded in the token claims.
    #[must_use]
    pub fn organization_role(&self) -> &str {
        self.organization_role.as_str()
    }

    /// Returns the external tenant id of the organization.
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        self.tenant_id.as_str()
    }
}

/// Per-request values passed as the first argument down every service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    request_id: Uuid,
    principal: Option<Principal>,
}

impl RequestContext {
    /// Creates a context for an unauthenticated request.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            principal: None,
        }
    }

    /// Creates a context for an authenticated request.
    #[must_use]
    pub fn authenticated(principal: Principal) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            principal: Some(principal),
        }
    }

    /// Returns the correlation id used in logs.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Returns the authenticated caller, if any.
    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Returns the authenticated caller or an `Unauthorized` error.
    pub fn require_principal(&self) -> crate::AppResult<&Principal> {
        self.principal
            .as_ref()
            .ok_or_else(|| crate::AppError::Unauthorized("authentication required".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{Principal, RequestContext};

    #[test]
    fn anonymous_context_requires_principal() {
        let context = RequestContext::anonymous();
        assert!(context.require_principal().is_err());
    }

    #[test]
    fn authenticated_context_exposes_principal() {
        let organization_id = Uuid::new_v4();
        let context = RequestContext::authenticated(Principal::new(
            "acct-1",
            Uuid::new_v4(),
            organization_id,
            "owner",
            "tenant-a",
        ));

        let principal = context.require_principal();
        assert!(principal.is_ok());
        assert_eq!(
            principal.map(Principal::organization_id).ok(),
            Some(organization_id)
        );
    }
}
