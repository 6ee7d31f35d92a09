//! Bearer-token authentication into a [`RequestContext`].

use std::sync::Arc;

use leasewell_core::{AppResult, Principal, RequestContext};
use leasewell_domain::CustomClaims;
use tracing::debug;

use crate::{IdentityGateway, SessionSigner};

/// Turns bearer tokens into authenticated request contexts.
///
/// Session artifacts issued during provisioning are checked locally; every
/// other token goes to the identity provider.
#[derive(Clone)]
pub struct AuthenticationService {
    identity_gateway: Arc<dyn IdentityGateway>,
    session_signer: SessionSigner,
}

impl AuthenticationService {
    /// Creates a new authentication service.
    #[must_use]
    pub fn new(identity_gateway: Arc<dyn IdentityGateway>, session_signer: SessionSigner) -> Self {
        Self {
            identity_gateway,
            session_signer,
        }
    }

    /// Verifies a bearer token and decodes its organization claims.
    pub async fn authenticate(&self, token: &str) -> AppResult<RequestContext> {
        let (account_id, claims) = if token.matches('.').count() == 1 {
            self.session_signer.verify(token)?
        } else {
            let verified = self.identity_gateway.verify_token(token).await?;
            let claims = CustomClaims::from_map(&verified.claims)?;
            (verified.account_id, claims)
        };

        let principal = Principal::new(
            account_id,
            claims.subject_profile_id.as_uuid(),
            claims.organization_id.as_uuid(),
            claims.organization_role,
            claims.tenant_id,
        );
        let ctx = RequestContext::authenticated(principal);
        debug!(request_id = %ctx.request_id(), "authenticated bearer token");
        Ok(ctx)
    }
}
