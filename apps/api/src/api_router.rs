use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use leasewell_core::AppError;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

mod cors;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route(
            "/api/organizations/{organization_id}/invitations",
            post(handlers::provisioning::invite_member_handler),
        )
        .route(
            "/api/authorization/check",
            post(handlers::authorization::check_permissions_handler),
        )
        .route(
            "/api/roles/{role_id}/grants",
            put(handlers::roles::grant_permission_handler)
                .delete(handlers::roles::revoke_permission_handler),
        )
        .route(
            "/api/organization-users/{organization_user_id}/role",
            put(handlers::roles::change_member_role_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/api/onboarding",
            post(handlers::provisioning::onboarding_handler),
        )
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .with_state(app_state))
}
