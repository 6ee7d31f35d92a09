use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use leasewell_application::ProvisioningFailure;
use leasewell_core::AppError;
use tracing::error;

mod types;

pub use types::ErrorResponse;

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl From<ProvisioningFailure> for ApiError {
    fn from(value: ProvisioningFailure) -> Self {
        if !value.run.is_compensated() {
            error!(
                run_id = %value.run.run_id(),
                account_id = ?value.run.account_id(),
                "provisioning run left residual artifacts"
            );
        }
        Self(value.error)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Dependency(_) => StatusCode::BAD_GATEWAY,
            AppError::Cache(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let payload = Json(ErrorResponse::new(self.0.to_string()));

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use leasewell_core::AppError;

    use super::ApiError;

    #[test]
    fn error_categories_map_to_status_codes() {
        let cases = [
            (AppError::Validation("bad".to_owned()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("gone".to_owned()), StatusCode::NOT_FOUND),
            (AppError::Conflict("taken".to_owned()), StatusCode::CONFLICT),
            (
                AppError::Unauthorized("who".to_owned()),
                StatusCode::UNAUTHORIZED,
            ),
            (AppError::Forbidden("no".to_owned()), StatusCode::FORBIDDEN),
            (
                AppError::Dependency("idp down".to_owned()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AppError::Cache("redis down".to_owned()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::Internal("boom".to_owned()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError(error).into_response().status(), expected);
        }
    }
}
