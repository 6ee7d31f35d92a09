//! Shared primitives for all Rust crates in Leasewell.

#![forbid(unsafe_code)]

/// Explicit per-request context threaded through services.
pub mod context;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use context::{Principal, RequestContext};

/// Result type used across Leasewell crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string. Surrounding whitespace is trimmed.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
///
/// Every variant carries a rendered message so the error can be cloned and
/// handed to several waiters of one failed batch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but blocked by authorization policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A remote dependency such as the identity provider failed.
    #[error("dependency failure: {0}")]
    Dependency(String),

    /// The cache store failed. Never fatal for authorization checks.
    #[error("cache error: {0}")]
    Cache(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns `true` when the error means the target is already gone.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{AppError, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn non_empty_string_trims_input() {
        let value = NonEmptyString::new("  Acme LLC ");
        assert_eq!(
            value.map(String::from).unwrap_or_default(),
            "Acme LLC".to_owned()
        );
    }

    #[test]
    fn dependency_error_renders_category() {
        let error = AppError::Dependency("identity provider timed out".to_owned());
        assert_eq!(
            error.to_string(),
            "dependency failure: identity provider timed out"
        );
        assert!(!error.is_not_found());
    }

    proptest! {
        #[test]
        fn non_empty_string_never_keeps_outer_whitespace(value in "[ ]{0,3}[a-z]{1,12}[ ]{0,3}") {
            let parsed = NonEmptyString::new(value.clone());
            prop_assert!(parsed.is_ok());
            let parsed = parsed.map(String::from).unwrap_or_default();
            prop_assert_eq!(parsed.as_str(), value.trim());
        }
    }
}
