//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_email_service;
mod http_identity_gateway;
mod in_memory_permission_cache_store;
mod postgres_organization_graph_repository;
mod postgres_permission_catalog_repository;
mod postgres_role_catalog_repository;
mod redis_permission_cache_store;
mod smtp_email_service;

pub use console_email_service::ConsoleEmailService;
pub use http_identity_gateway::HttpIdentityGateway;
pub use in_memory_permission_cache_store::InMemoryPermissionCacheStore;
pub use postgres_organization_graph_repository::PostgresOrganizationGraphRepository;
pub use postgres_permission_catalog_repository::PostgresPermissionCatalogRepository;
pub use postgres_role_catalog_repository::PostgresRoleCatalogRepository;
pub use redis_permission_cache_store::RedisPermissionCacheStore;
pub use smtp_email_service::{SmtpEmailConfig, SmtpEmailService};
