use leasewell_application::{
    AuthenticationService, AuthorizationEngine, ProvisioningSaga, ProvisioningVariant,
    RoleCatalogService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub provisioning_saga: ProvisioningSaga,
    pub owner_onboarding: ProvisioningVariant,
    pub member_invitation: ProvisioningVariant,
    pub authorization_engine: AuthorizationEngine,
    pub role_catalog_service: RoleCatalogService,
    pub authentication_service: AuthenticationService,
    pub postgres_pool: sqlx::PgPool,
    pub redis_client: Option<redis::Client>,
    pub redis_required: bool,
}
