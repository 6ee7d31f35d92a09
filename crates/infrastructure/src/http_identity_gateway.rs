//! Identity-provider adapter speaking the provider's JSON admin API.

use async_trait::async_trait;
use leasewell_application::{IdentityGateway, VerifiedToken};
use leasewell_core::{AppError, AppResult};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// HTTP implementation of the identity gateway port.
#[derive(Clone)]
pub struct HttpIdentityGateway {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAccountRequest<'a> {
    email: &'a str,
    password: &'a str,
    display_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateAccountResponse {
    id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAccountRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SetClaimsRequest<'a> {
    claims: &'a Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct VerifyTokenRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyTokenResponse {
    account_id: String,
    #[serde(default)]
    claims: Map<String, Value>,
}

impl HttpIdentityGateway {
    /// Creates a gateway for the provider at `base_url`.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl IdentityGateway for HttpIdentityGateway {
    async fn create_account(
        &self,
        email: &str,
        secret: &str,
        display_name: &str,
    ) -> AppResult<String> {
        let response = self
            .http_client
            .post(self.url("/accounts"))
            .bearer_auth(&self.api_key)
            .json(&CreateAccountRequest {
                email,
                password: secret,
                display_name,
            })
            .send()
            .await
            .map_err(|error| transport_error("create account", &error))?;

        match response.status() {
            status if status.is_success() => {
                let created: CreateAccountResponse = response.json().await.map_err(|error| {
                    AppError::Dependency(format!(
                        "identity provider returned an unreadable account: {error}"
                    ))
                })?;
                debug!(account_id = %created.id, "identity account created");
                Ok(created.id)
            }
            StatusCode::CONFLICT => Err(AppError::Conflict(format!(
                "an account for '{email}' already exists"
            ))),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(AppError::Validation(format!(
                    "identity provider rejected the account: {}",
                    body_text(response).await
                )))
            }
            status => Err(status_error("create account", status, response).await),
        }
    }

    async fn update_account(
        &self,
        account_id: &str,
        email: Option<&str>,
        display_name: Option<&str>,
    ) -> AppResult<()> {
        if email.is_none() && display_name.is_none() {
            return Ok(());
        }

        let response = self
            .http_client
            .patch(self.url(&format!("/accounts/{account_id}")))
            .bearer_auth(&self.api_key)
            .json(&UpdateAccountRequest {
                email,
                display_name,
            })
            .send()
            .await
            .map_err(|error| transport_error("update account", &error))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(AppError::NotFound(format!(
                "account '{account_id}' does not exist"
            ))),
            StatusCode::CONFLICT => Err(AppError::Conflict(format!(
                "another account already uses '{}'",
                email.unwrap_or_default()
            ))),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(AppError::Validation(format!(
                    "identity provider rejected the update: {}",
                    body_text(response).await
                )))
            }
            status => Err(status_error("update account", status, response).await),
        }
    }

    async fn delete_account(&self, account_id: &str) -> AppResult<()> {
        let response = self
            .http_client
            .delete(self.url(&format!("/accounts/{account_id}")))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|error| transport_error("delete account", &error))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Ok(()),
            status => Err(status_error("delete account", status, response).await),
        }
    }

    async fn set_claims(&self, account_id: &str, claims: &Map<String, Value>) -> AppResult<()> {
        let response = self
            .http_client
            .put(self.url(&format!("/accounts/{account_id}/claims")))
            .bearer_auth(&self.api_key)
            .json(&SetClaimsRequest { claims })
            .send()
            .await
            .map_err(|error| transport_error("set claims", &error))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            status => Err(status_error("set claims", status, response).await),
        }
    }

    async fn verify_token(&self, token: &str) -> AppResult<VerifiedToken> {
        let response = self
            .http_client
            .post(self.url("/tokens/verify"))
            .bearer_auth(&self.api_key)
            .json(&VerifyTokenRequest { token })
            .send()
            .await
            .map_err(|error| transport_error("verify token", &error))?;

        match response.status() {
            status if status.is_success() => {
                let verified: VerifyTokenResponse = response.json().await.map_err(|error| {
                    AppError::Dependency(format!(
                        "identity provider returned an unreadable verification: {error}"
                    ))
                })?;
                Ok(VerifiedToken {
                    account_id: verified.account_id,
                    claims: verified.claims,
                })
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(AppError::Unauthorized("bearer token was rejected".to_owned()))
            }
            status => Err(status_error("verify token", status, response).await),
        }
    }
}

fn transport_error(operation: &str, error: &reqwest::Error) -> AppError {
    AppError::Dependency(format!("identity provider {operation} failed: {error}"))
}

async fn status_error(operation: &str, status: StatusCode, response: reqwest::Response) -> AppError {
    AppError::Dependency(format!(
        "identity provider {operation} failed with status {status}: {}",
        body_text(response).await
    ))
}

async fn body_text(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "<response body unavailable>".to_owned())
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value, json};

    use super::{
        CreateAccountRequest, HttpIdentityGateway, SetClaimsRequest, UpdateAccountRequest,
        VerifyTokenResponse,
    };

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let gateway =
            HttpIdentityGateway::new(reqwest::Client::new(), "https://idp.test/admin/", "key");

        assert_eq!(gateway.url("/accounts"), "https://idp.test/admin/accounts");
    }

    #[test]
    fn request_bodies_use_provider_field_names() {
        let create = serde_json::to_value(CreateAccountRequest {
            email: "a@acme.com",
            password: "correct-horse-battery",
            display_name: "Ada Lovelace",
        })
        .unwrap_or_default();
        assert_eq!(create["displayName"], "Ada Lovelace");

        let mut claims = Map::new();
        claims.insert("tenantId".to_owned(), Value::from("acme"));
        let body = serde_json::to_value(SetClaimsRequest { claims: &claims }).unwrap_or_default();
        assert_eq!(body, json!({"claims": {"tenantId": "acme"}}));
    }

    #[test]
    fn account_updates_send_only_the_changed_fields() {
        let rename = serde_json::to_value(UpdateAccountRequest {
            email: None,
            display_name: Some("Ada King"),
        })
        .unwrap_or_default();
        assert_eq!(rename, json!({"displayName": "Ada King"}));

        let both = serde_json::to_value(UpdateAccountRequest {
            email: Some("ada@acme.com"),
            display_name: Some("Ada King"),
        })
        .unwrap_or_default();
        assert_eq!(both, json!({"email": "ada@acme.com", "displayName": "Ada King"}));
    }

    #[test]
    fn verification_without_claims_decodes_to_empty_map() {
        let verified: Option<VerifyTokenResponse> =
            serde_json::from_value(json!({"accountId": "acct-1"})).ok();

        assert_eq!(
            verified.map(|verified| (verified.account_id, verified.claims.len())),
            Some(("acct-1".to_owned(), 0))
        );
    }
}
