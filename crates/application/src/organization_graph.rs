//! Transactional row graph behind every provisioned account.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use leasewell_core::{AppError, AppResult};
use leasewell_domain::{
    EmailAddress, Invitation, InvitationId, InvitationStatus, Organization, OrganizationId,
    OrganizationName, OrganizationRole, OrganizationUser, OrganizationUserId, PersonName, RoleId,
    UserProfile, UserProfileId,
};
use serde_json::{Map, Value};
use tracing::info;

use crate::{RoleCatalogRepository, random_hex};

/// Bytes of randomness in a generated cross-site-request secret.
const CSRF_SECRET_BYTES: usize = 32;
/// Bytes of randomness appended to the tenant slug.
const TENANT_SUFFIX_BYTES: usize = 4;
const TENANT_SLUG_MAX_LENGTH: usize = 40;

/// Input for a new tenant and its owner.
#[derive(Debug, Clone)]
pub struct OwnerGraphInput {
    /// Organization display name.
    pub organization_name: OrganizationName,
    /// Optional ISO country code.
    pub country: Option<String>,
    /// Optional organization settings document.
    pub settings: Option<Value>,
    /// Owner email.
    pub email: EmailAddress,
    /// Owner name.
    pub name: PersonName,
}

/// Input for a new member of an existing organization.
#[derive(Debug, Clone)]
pub struct MemberGraphInput {
    /// Organization joined.
    pub organization_id: OrganizationId,
    /// Role chosen by the inviter. Falls back to the variant default.
    pub role_id: Option<RoleId>,
    /// Invitee email.
    pub email: EmailAddress,
    /// Invitee name.
    pub name: PersonName,
    /// Inviting profile, when known.
    pub invited_by: Option<UserProfileId>,
}

/// Whether the graph creates its organization or attaches to one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizationPlan {
    /// Insert this organization row.
    Create(Organization),
    /// Attach to an existing, active organization.
    Existing(OrganizationId),
}

/// Fully resolved rows handed to the repository for one atomic insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphPlan {
    /// Organization to create or reuse.
    pub organization: OrganizationPlan,
    /// Role the membership binds to.
    pub role: OrganizationRole,
    /// Profile bound to the external account.
    pub user_profile: UserProfile,
    /// Membership row.
    pub organization_user: OrganizationUser,
    /// Invitation row for member onboarding.
    pub invitation: Option<Invitation>,
}

/// Rows persisted by one provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationGraph {
    /// Organization the member belongs to.
    pub organization: Organization,
    /// Membership row.
    pub organization_user: OrganizationUser,
    /// Profile row.
    pub user_profile: UserProfile,
    /// Bound role.
    pub role: OrganizationRole,
    /// Invitation row, member onboarding only.
    pub invitation: Option<Invitation>,
    /// Whether this run inserted the organization.
    pub organization_created: bool,
}

/// Store port for the provisioning row graph.
#[async_trait]
pub trait OrganizationGraphRepository: Send + Sync {
    /// Finds an organization by id.
    async fn find_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Option<Organization>>;

    /// Inserts every row of the plan in one transaction.
    ///
    /// Returns `AppError::Conflict` when the organization name is taken by an
    /// active organization and `AppError::NotFound` when an existing organization
    /// is no longer active.
    async fn persist_graph(&self, plan: GraphPlan) -> AppResult<OrganizationGraph>;

    /// Deletes the rows of a graph in one transaction. Missing rows are ignored.
    async fn remove_graph(&self, graph: &OrganizationGraph) -> AppResult<()>;
}

/// Resolves roles, generates tenant secrets and persists the row graph.
#[derive(Clone)]
pub struct OrganizationGraphBuilder {
    repository: Arc<dyn OrganizationGraphRepository>,
    role_catalog: Arc<dyn RoleCatalogRepository>,
}

impl OrganizationGraphBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(
        repository: Arc<dyn OrganizationGraphRepository>,
        role_catalog: Arc<dyn RoleCatalogRepository>,
    ) -> Self {
        Self {
            repository,
            role_catalog,
        }
    }

    /// Creates a tenant organization with its owner membership and profile.
    pub async fn build_owner_graph(
        &self,
        input: &OwnerGraphInput,
        account_id: &str,
        default_role_name: &str,
    ) -> AppResult<OrganizationGraph> {
        let organization = Organization {
            id: OrganizationId::new(),
            tenant_id: tenant_id_for(&input.organization_name)?,
            name: input.organization_name.as_str().to_owned(),
            country: input.country.clone(),
            settings: input
                .settings
                .clone()
                .unwrap_or_else(|| Value::Object(Map::new())),
            csrf_secret: random_hex(CSRF_SECRET_BYTES)?,
            is_active: true,
            is_deleted: false,
            created_at: Utc::now(),
        };

        let role = self.role_by_name(organization.id, default_role_name).await?;
        let user_profile = new_profile(account_id, &input.email, &input.name);
        let organization_user = new_membership(&user_profile, organization.id, role.id);

        let graph = self
            .repository
            .persist_graph(GraphPlan {
                organization: OrganizationPlan::Create(organization),
                role,
                user_profile,
                organization_user,
                invitation: None,
            })
            .await?;

        info!(
            organization_id = %graph.organization.id,
            tenant_id = %graph.organization.tenant_id,
            profile_id = %graph.user_profile.id,
            "created organization graph"
        );
        Ok(graph)
    }

    /// Adds a member to an existing organization and records the invitation.
    pub async fn build_member_graph(
        &self,
        input: &MemberGraphInput,
        account_id: &str,
        default_role_name: &str,
        invitation_token_hash: String,
    ) -> AppResult<OrganizationGraph> {
        let organization = self
            .repository
            .find_organization(input.organization_id)
            .await?
            .filter(|organization| organization.is_active && !organization.is_deleted)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "organization '{}' does not exist",
                    input.organization_id
                ))
            })?;

        let role = match input.role_id {
            Some(role_id) => {
                let role = self
                    .role_catalog
                    .find_role(role_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;
                if !role.is_assignable_in(organization.id) {
                    return Err(AppError::Validation(format!(
                        "role '{}' cannot be assigned in organization '{}'",
                        role.name, organization.id
                    )));
                }
                role
            }
            None => self.role_by_name(organization.id, default_role_name).await?,
        };

        let user_profile = new_profile(account_id, &input.email, &input.name);
        let organization_user = new_membership(&user_profile, organization.id, role.id);
        let invitation = Invitation {
            id: InvitationId::new(),
            organization_id: organization.id,
            email: input.email.as_str().to_owned(),
            first_name: input.name.first().to_owned(),
            last_name: input.name.last().to_owned(),
            role_id: role.id,
            invited_by: input.invited_by,
            token_hash: invitation_token_hash,
            status: InvitationStatus::Pending,
            created_at: Utc::now(),
        };

        let graph = self
            .repository
            .persist_graph(GraphPlan {
                organization: OrganizationPlan::Existing(organization.id),
                role,
                user_profile,
                organization_user,
                invitation: Some(invitation),
            })
            .await?;

        info!(
            organization_id = %graph.organization.id,
            profile_id = %graph.user_profile.id,
            role = %graph.role.name,
            "created member graph"
        );
        Ok(graph)
    }

    /// Removes the rows a provisioning run created.
    pub async fn dismantle(&self, graph: &OrganizationGraph) -> AppResult<()> {
        self.repository.remove_graph(graph).await
    }

    async fn role_by_name(
        &self,
        organization_id: OrganizationId,
        role_name: &str,
    ) -> AppResult<OrganizationRole> {
        self.role_catalog
            .find_role_by_name(organization_id, role_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_name}' does not exist")))
    }
}

fn new_profile(account_id: &str, email: &EmailAddress, name: &PersonName) -> UserProfile {
    UserProfile {
        id: UserProfileId::new(),
        account_id: account_id.to_owned(),
        email: email.as_str().to_owned(),
        first_name: name.first().to_owned(),
        last_name: name.last().to_owned(),
        created_at: Utc::now(),
    }
}

fn new_membership(
    user_profile: &UserProfile,
    organization_id: OrganizationId,
    role_id: RoleId,
) -> OrganizationUser {
    OrganizationUser {
        id: OrganizationUserId::new(),
        profile_id: user_profile.id,
        organization_id,
        role_id,
        is_active: true,
    }
}

/// Builds `slug-xxxxxxxx` from the organization name.
fn tenant_id_for(name: &OrganizationName) -> AppResult<String> {
    let mut slug = String::with_capacity(TENANT_SLUG_MAX_LENGTH);
    for character in name.as_str().chars() {
        if slug.len() >= TENANT_SLUG_MAX_LENGTH {
            break;
        }
        if character.is_ascii_alphanumeric() {
            slug.push(character.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    let slug = if slug.is_empty() { "tenant" } else { slug };

    Ok(format!("{slug}-{}", random_hex(TENANT_SUFFIX_BYTES)?))
}
