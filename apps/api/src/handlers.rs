pub mod authorization;
pub mod health;
pub mod provisioning;
pub mod roles;
