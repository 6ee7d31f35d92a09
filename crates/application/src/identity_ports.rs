use async_trait::async_trait;
use leasewell_core::AppResult;
use serde_json::{Map, Value};

/// Account id and claims decoded from a verified bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedToken {
    /// Identity-provider account id.
    pub account_id: String,
    /// Custom claims embedded in the token.
    pub claims: Map<String, Value>,
}

/// Port for the external identity provider.
///
/// Every call is a remote round trip that can fail independently of the
/// relational store. Failures surface as `AppError::Dependency`.
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Creates an account and returns its provider id.
    async fn create_account(
        &self,
        email: &str,
        secret: &str,
        display_name: &str,
    ) -> AppResult<String>;

    /// Changes the email and/or display name of an account.
    ///
    /// `None` leaves a field as it is; an update naming nothing is a no-op.
    async fn update_account(
        &self,
        account_id: &str,
        email: Option<&str>,
        display_name: Option<&str>,
    ) -> AppResult<()>;

    /// Deletes an account. Deleting a missing account succeeds.
    async fn delete_account(&self, account_id: &str) -> AppResult<()>;

    /// Replaces the custom claims stored on an account.
    async fn set_claims(&self, account_id: &str, claims: &Map<String, Value>) -> AppResult<()>;

    /// Verifies a bearer token and returns the account it was issued for.
    async fn verify_token(&self, token: &str) -> AppResult<VerifiedToken>;
}

/// Port for sending emails. Infrastructure provides SMTP or console implementations.
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Sends a plain-text or HTML email.
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use leasewell_core::AppError;

    use crate::test_fakes::FakeIdentityGateway;

    use super::IdentityGateway;

    #[tokio::test]
    async fn update_changes_only_the_named_fields() {
        let gateway = FakeIdentityGateway::default();
        let Ok(ada) = gateway
            .create_account("ada@acme.com", "correct-horse-battery", "Ada Lovelace")
            .await
        else {
            panic!("account should be created");
        };
        let Ok(grace) = gateway
            .create_account("grace@acme.com", "correct-horse-battery", "Grace Hopper")
            .await
        else {
            panic!("account should be created");
        };

        assert!(gateway.update_account(&ada, None, Some("Ada King")).await.is_ok());
        assert!(matches!(
            gateway.update_account(&ada, Some("grace@acme.com"), None).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            gateway.update_account("acct-missing", None, Some("Nobody")).await,
            Err(AppError::NotFound(_))
        ));

        let accounts = gateway.accounts.lock().await;
        let names = [&ada, &grace].map(|id| {
            accounts
                .get(id.as_str())
                .map(|account| (account.email.clone(), account.display_name.clone()))
        });
        assert_eq!(
            names,
            [
                Some(("ada@acme.com".to_owned(), "Ada King".to_owned())),
                Some(("grace@acme.com".to_owned(), "Grace Hopper".to_owned())),
            ]
        );
    }
}
