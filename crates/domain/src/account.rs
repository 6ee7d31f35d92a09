//! Identity-account inputs: email, person name and initial secret rules.

use leasewell_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Validated, lower-cased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: exactly one `@`, non-empty
    /// local part, and a domain with at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        };

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.contains('@') {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// First and last name of a person being provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    first: NonEmptyString,
    last: NonEmptyString,
}

impl PersonName {
    /// Creates a validated name pair.
    pub fn new(first: impl Into<String>, last: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            first: NonEmptyString::new(first)?,
            last: NonEmptyString::new(last)?,
        })
    }

    /// Returns the first name.
    #[must_use]
    pub fn first(&self) -> &str {
        self.first.as_str()
    }

    /// Returns the last name.
    #[must_use]
    pub fn last(&self) -> &str {
        self.last.as_str()
    }

    /// Returns the name as shown by the identity provider.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first.as_str(), self.last.as_str())
    }
}

/// Minimum length of an account secret (NIST SP800-63B, no MFA assumed).
pub const SECRET_MIN_LENGTH: usize = 10;

/// Maximum length of an account secret.
pub const SECRET_MAX_LENGTH: usize = 128;

/// Validates an initial account secret before it is sent to the identity provider.
pub fn validate_account_secret(secret: &str) -> AppResult<()> {
    let char_count = secret.chars().count();

    if char_count < SECRET_MIN_LENGTH {
        return Err(AppError::Validation(format!(
            "password must be at least {SECRET_MIN_LENGTH} characters"
        )));
    }

    if char_count > SECRET_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "password must not exceed {SECRET_MAX_LENGTH} characters"
        )));
    }

    let lowered = secret.to_lowercase();
    if COMMON_SECRETS.iter().any(|entry| *entry == lowered) {
        return Err(AppError::Validation(
            "this password is too common and has appeared in data breaches".to_owned(),
        ));
    }

    Ok(())
}

static COMMON_SECRETS: &[&str] = &[
    "1234567890",
    "qwertyuiop",
    "password123",
    "password1234",
    "iloveyou123",
    "letmein123",
    "welcome123",
    "qwerty1234",
    "0987654321",
    "1q2w3e4r5t",
];
