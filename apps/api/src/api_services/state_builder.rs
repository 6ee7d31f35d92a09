use std::sync::Arc;
use std::time::Duration;

use leasewell_application::{
    AuthenticationService, AuthorizationEngine, GrantRepository, IdentityGateway,
    InvitationSigner, OrganizationGraphBuilder, PermissionCache, PermissionCatalogRepository,
    ProvisioningSaga, ProvisioningVariant, RoleCatalogRepository, RoleCatalogService,
    SessionSigner,
};
use leasewell_core::AppError;
use leasewell_infrastructure::{
    HttpIdentityGateway, PostgresOrganizationGraphRepository, PostgresPermissionCatalogRepository,
    PostgresRoleCatalogRepository,
};
use sqlx::PgPool;

use crate::api_config::{ApiConfig, PermissionCacheBackend};
use crate::state::AppState;

use super::email::build_email_service;
use super::redis::build_redis_client;

mod caches;

const IDENTITY_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> Result<AppState, AppError> {
    let redis_client = config
        .redis_url
        .as_deref()
        .map(build_redis_client)
        .transpose()?;

    let role_repository = Arc::new(PostgresRoleCatalogRepository::new(pool.clone()));
    let role_catalog: Arc<dyn RoleCatalogRepository> = role_repository.clone();
    let grant_repository: Arc<dyn GrantRepository> = role_repository;
    let permission_catalog: Arc<dyn PermissionCatalogRepository> =
        Arc::new(PostgresPermissionCatalogRepository::new(pool.clone()));

    let cache_store = caches::build_permission_cache_store(config, redis_client.clone())?;
    let authorization_engine = AuthorizationEngine::new(
        role_catalog.clone(),
        permission_catalog.clone(),
        grant_repository,
        PermissionCache::new(cache_store, config.permission_cache_ttl_seconds),
    );

    let http_client = reqwest::Client::builder()
        .timeout(IDENTITY_PROVIDER_TIMEOUT)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build http client: {error}")))?;
    let identity_gateway: Arc<dyn IdentityGateway> = Arc::new(HttpIdentityGateway::new(
        http_client,
        config.identity_provider_url.clone(),
        config.identity_provider_api_key.clone(),
    ));
    let session_signer = SessionSigner::new(
        config.session_signing_secret.clone(),
        config.session_ttl_seconds,
    )?;

    let graph_builder = OrganizationGraphBuilder::new(
        Arc::new(PostgresOrganizationGraphRepository::new(pool.clone())),
        role_catalog.clone(),
    );
    let provisioning_saga = ProvisioningSaga::new(
        identity_gateway.clone(),
        graph_builder,
        authorization_engine.clone(),
        build_email_service(config)?,
        InvitationSigner::new(config.invitation_secret.clone())?,
        session_signer.clone(),
        config.frontend_url.clone(),
    );

    Ok(AppState {
        provisioning_saga,
        owner_onboarding: ProvisioningVariant::owner_onboarding(),
        member_invitation: ProvisioningVariant::member_invitation(),
        role_catalog_service: RoleCatalogService::new(
            role_catalog,
            permission_catalog,
            authorization_engine.clone(),
        ),
        authorization_engine,
        authentication_service: AuthenticationService::new(identity_gateway, session_signer),
        postgres_pool: pool,
        redis_client,
        redis_required: config.permission_cache_backend == PermissionCacheBackend::Redis,
    })
}
