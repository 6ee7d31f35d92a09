use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use leasewell_core::AppError;
use tracing::debug;

use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the bearer token into a `RequestContext` extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized("bearer token required".to_owned()))?;

    let ctx = state.authentication_service.authenticate(token).await?;
    debug!(request_id = %ctx.request_id(), path = %request.uri().path(), "authenticated request");

    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, header};

    use super::bearer_token;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn bearer_token_is_extracted() {
        let headers = headers_with("Bearer abc.def");
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        let headers = headers_with("bearer  token ");
        assert_eq!(bearer_token(&headers), Some("token"));
    }

    #[test]
    fn other_schemes_and_blank_tokens_are_ignored() {
        assert_eq!(bearer_token(&headers_with("Basic dXNlcg==")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
