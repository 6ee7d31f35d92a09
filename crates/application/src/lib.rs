//! Application services and ports.

#![forbid(unsafe_code)]

mod authentication_service;
mod authorization_engine;
mod catalog_ports;
mod grant_batch_loader;
mod identity_ports;
mod organization_graph;
mod permission_cache;
mod provisioning_saga;
mod role_catalog_service;
mod signing;

#[cfg(test)]
mod test_fakes;

pub use authentication_service::AuthenticationService;
pub use authorization_engine::{AuthorizationEngine, PermissionCheck};
pub use catalog_ports::{
    GrantRepository, Membership, PermissionCatalogRepository, RoleCatalogRepository, RoleMember,
};
pub use grant_batch_loader::GrantBatchLoader;
pub use identity_ports::{EmailService, IdentityGateway, VerifiedToken};
pub use organization_graph::{
    GraphPlan, MemberGraphInput, OrganizationGraph, OrganizationGraphBuilder,
    OrganizationGraphRepository, OrganizationPlan, OwnerGraphInput,
};
pub use permission_cache::{
    CacheStore, DEFAULT_PERMISSION_CACHE_TTL_SECONDS, PermissionCache, PermissionCacheKey,
};
pub use provisioning_saga::{
    InviteMemberInput, NotificationTemplates, OnboardOrganizationInput, ProvisioningFailure,
    ProvisioningKind, ProvisioningReceipt, ProvisioningRun, ProvisioningSaga, ProvisioningState,
    ProvisioningVariant,
};
pub use role_catalog_service::RoleCatalogService;
pub use signing::{InvitationSigner, SessionArtifact, SessionSigner, random_hex, sha256_hex};
