use serde::{Deserialize, Serialize};

/// One feature/permission pair to check for the caller.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthorizationCheckItem {
    pub feature: String,
    pub permission: String,
}

/// Incoming payload for a batch of authorization checks.
#[derive(Debug, Deserialize)]
pub struct AuthorizationCheckRequest {
    pub checks: Vec<AuthorizationCheckItem>,
}

/// Decision for one requested pair.
#[derive(Debug, Serialize)]
pub struct AuthorizationCheckResult {
    #[serde(flatten)]
    pub check: AuthorizationCheckItem,
    pub allowed: bool,
}

/// Decisions in request order.
#[derive(Debug, Serialize)]
pub struct AuthorizationCheckResponse {
    pub results: Vec<AuthorizationCheckResult>,
}
