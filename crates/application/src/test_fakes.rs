//! In-memory port implementations shared by the service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use leasewell_core::{AppError, AppResult};
use leasewell_domain::{
    Feature, FeatureId, FeaturePermission, FeaturePermissionId, GrantKey, Invitation,
    InvitationId, Organization, OrganizationId, OrganizationRole, OrganizationUser,
    OrganizationUserId, Permission, PermissionId, RoleFeaturePermission, RoleFeaturePermissionId,
    RoleId, UserProfile, UserProfileId,
};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    CacheStore, EmailService, GrantRepository, GraphPlan, IdentityGateway, Membership,
    OrganizationGraph, OrganizationGraphRepository, OrganizationPlan, PermissionCatalogRepository,
    RoleCatalogRepository, RoleMember, VerifiedToken,
};

#[derive(Default)]
pub(crate) struct StoreState {
    pub organizations: HashMap<OrganizationId, Organization>,
    pub profiles: HashMap<UserProfileId, UserProfile>,
    pub organization_users: HashMap<OrganizationUserId, OrganizationUser>,
    pub invitations: HashMap<InvitationId, Invitation>,
    pub roles: HashMap<RoleId, OrganizationRole>,
    pub features: Vec<Feature>,
    pub permissions: Vec<Permission>,
    pub feature_permissions: Vec<FeaturePermission>,
    pub grants: Vec<RoleFeaturePermission>,
}

/// Relational store stand-in implementing every repository port.
#[derive(Default)]
pub(crate) struct FakeStore {
    pub state: Mutex<StoreState>,
    pub grant_queries: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_persist: AtomicBool,
    pub fail_remove: AtomicBool,
}

impl FakeStore {
    pub async fn seed_organization(&self, name: &str) -> Organization {
        let organization = Organization {
            id: OrganizationId::new(),
            tenant_id: format!("{}-seed", name.to_lowercase().replace(' ', "-")),
            name: name.to_owned(),
            country: None,
            settings: Value::Object(Map::new()),
            csrf_secret: "seed-secret".to_owned(),
            is_active: true,
            is_deleted: false,
            created_at: Utc::now(),
        };
        self.state
            .lock()
            .await
            .organizations
            .insert(organization.id, organization.clone());
        organization
    }

    pub async fn seed_role(
        &self,
        name: &str,
        organization_id: Option<OrganizationId>,
    ) -> OrganizationRole {
        let role = OrganizationRole {
            id: RoleId::new(),
            name: name.to_owned(),
            organization_id,
            is_internal: false,
        };
        self.state.lock().await.roles.insert(role.id, role.clone());
        role
    }

    pub async fn seed_feature_permission(
        &self,
        feature_name: &str,
        permission_name: &str,
    ) -> FeaturePermission {
        let mut state = self.state.lock().await;
        let feature_id = match state
            .features
            .iter()
            .find(|feature| feature.name == feature_name)
        {
            Some(feature) => feature.id,
            None => {
                let feature = Feature {
                    id: FeatureId::new(),
                    name: feature_name.to_owned(),
                };
                let id = feature.id;
                state.features.push(feature);
                id
            }
        };
        let permission_id = match state
            .permissions
            .iter()
            .find(|permission| permission.name == permission_name)
        {
            Some(permission) => permission.id,
            None => {
                let permission = Permission {
                    id: PermissionId::new(),
                    name: permission_name.to_owned(),
                };
                let id = permission.id;
                state.permissions.push(permission);
                id
            }
        };

        let feature_permission = FeaturePermission {
            id: FeaturePermissionId::new(),
            feature_id,
            permission_id,
            description: format!("{feature_name}:{permission_name}"),
        };
        state.feature_permissions.push(feature_permission.clone());
        feature_permission
    }

    pub async fn seed_grant(
        &self,
        role_id: RoleId,
        feature_permission: &FeaturePermission,
    ) -> RoleFeaturePermission {
        let grant = RoleFeaturePermission {
            id: RoleFeaturePermissionId::new(),
            role_id,
            feature_id: feature_permission.feature_id,
            permission_id: feature_permission.permission_id,
            feature_permission_id: feature_permission.id,
        };
        self.state.lock().await.grants.push(grant.clone());
        grant
    }

    pub async fn seed_member(&self, organization_id: OrganizationId, role_id: RoleId) -> OrganizationUser {
        let profile = UserProfile {
            id: UserProfileId::new(),
            account_id: format!("acct-{}", Uuid::new_v4()),
            email: "member@acme.com".to_owned(),
            first_name: "Mem".to_owned(),
            last_name: "Ber".to_owned(),
            created_at: Utc::now(),
        };
        let organization_user = OrganizationUser {
            id: OrganizationUserId::new(),
            profile_id: profile.id,
            organization_id,
            role_id,
            is_active: true,
        };
        let mut state = self.state.lock().await;
        state.profiles.insert(profile.id, profile);
        state
            .organization_users
            .insert(organization_user.id, organization_user.clone());
        organization_user
    }

    fn check_reads(&self) -> AppResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Internal("store unavailable".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl PermissionCatalogRepository for FakeStore {
    async fn find_feature_by_name(&self, name: &str) -> AppResult<Option<Feature>> {
        self.check_reads()?;
        Ok(self
            .state
            .lock()
            .await
            .features
            .iter()
            .find(|feature| feature.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn find_permission_by_name(&self, name: &str) -> AppResult<Option<Permission>> {
        self.check_reads()?;
        Ok(self
            .state
            .lock()
            .await
            .permissions
            .iter()
            .find(|permission| permission.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn find_feature_permission(
        &self,
        feature_id: FeatureId,
        permission_id: PermissionId,
    ) -> AppResult<Option<FeaturePermission>> {
        Ok(self
            .state
            .lock()
            .await
            .feature_permissions
            .iter()
            .find(|pair| pair.feature_id == feature_id && pair.permission_id == permission_id)
            .cloned())
    }
}

#[async_trait]
impl RoleCatalogRepository for FakeStore {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<OrganizationRole>> {
        Ok(self.state.lock().await.roles.get(&role_id).cloned())
    }

    async fn find_role_by_name(
        &self,
        organization_id: OrganizationId,
        name: &str,
    ) -> AppResult<Option<OrganizationRole>> {
        let state = self.state.lock().await;
        let matching = state
            .roles
            .values()
            .filter(|role| role.name.eq_ignore_ascii_case(name))
            .collect::<Vec<_>>();
        Ok(matching
            .iter()
            .find(|role| role.organization_id == Some(organization_id))
            .or_else(|| matching.iter().find(|role| role.organization_id.is_none()))
            .map(|role| (*role).clone()))
    }

    async fn find_membership(
        &self,
        subject: UserProfileId,
        organization_id: OrganizationId,
    ) -> AppResult<Option<Membership>> {
        self.check_reads()?;
        let state = self.state.lock().await;
        let Some(organization_user) = state.organization_users.values().find(|row| {
            row.profile_id == subject && row.organization_id == organization_id && row.is_active
        }) else {
            return Ok(None);
        };
        Ok(state
            .roles
            .get(&organization_user.role_id)
            .map(|role| Membership {
                organization_user: organization_user.clone(),
                role: role.clone(),
            }))
    }

    async fn find_organization_user(
        &self,
        organization_user_id: OrganizationUserId,
    ) -> AppResult<Option<OrganizationUser>> {
        Ok(self
            .state
            .lock()
            .await
            .organization_users
            .get(&organization_user_id)
            .cloned())
    }

    async fn list_role_members(&self, role_id: RoleId) -> AppResult<Vec<RoleMember>> {
        Ok(self
            .state
            .lock()
            .await
            .organization_users
            .values()
            .filter(|row| row.role_id == role_id && row.is_active)
            .map(|row| RoleMember {
                profile_id: row.profile_id,
                organization_id: row.organization_id,
            })
            .collect())
    }

    async fn insert_grant(
        &self,
        role_id: RoleId,
        feature_permission: &FeaturePermission,
    ) -> AppResult<RoleFeaturePermission> {
        let key = GrantKey {
            role_id,
            feature_id: feature_permission.feature_id,
            permission_id: feature_permission.permission_id,
        };
        let mut state = self.state.lock().await;
        if let Some(existing) = state.grants.iter().find(|grant| grant.key() == key) {
            return Ok(existing.clone());
        }
        let grant = RoleFeaturePermission {
            id: RoleFeaturePermissionId::new(),
            role_id,
            feature_id: feature_permission.feature_id,
            permission_id: feature_permission.permission_id,
            feature_permission_id: feature_permission.id,
        };
        state.grants.push(grant.clone());
        Ok(grant)
    }

    async fn delete_grant(&self, key: GrantKey) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.grants.len();
        state.grants.retain(|grant| grant.key() != key);
        Ok(state.grants.len() != before)
    }

    async fn rebind_member_role(
        &self,
        organization_user_id: OrganizationUserId,
        role_id: RoleId,
    ) -> AppResult<OrganizationUser> {
        let mut state = self.state.lock().await;
        let row = state
            .organization_users
            .get_mut(&organization_user_id)
            .ok_or_else(|| AppError::NotFound("organization user not found".to_owned()))?;
        row.role_id = role_id;
        Ok(row.clone())
    }
}

#[async_trait]
impl GrantRepository for FakeStore {
    async fn find_grants(&self, keys: &[GrantKey]) -> AppResult<Vec<RoleFeaturePermission>> {
        self.grant_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .state
            .lock()
            .await
            .grants
            .iter()
            .filter(|grant| keys.contains(&grant.key()))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OrganizationGraphRepository for FakeStore {
    async fn find_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Option<Organization>> {
        Ok(self
            .state
            .lock()
            .await
            .organizations
            .get(&organization_id)
            .cloned())
    }

    async fn persist_graph(&self, plan: GraphPlan) -> AppResult<OrganizationGraph> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(AppError::Internal("transaction aborted".to_owned()));
        }

        let mut state = self.state.lock().await;
        let (organization, organization_created) = match plan.organization {
            OrganizationPlan::Create(organization) => {
                let taken = state.organizations.values().any(|existing| {
                    !existing.is_deleted && existing.name.eq_ignore_ascii_case(&organization.name)
                });
                if taken {
                    return Err(AppError::Conflict(format!(
                        "organization '{}' already exists",
                        organization.name
                    )));
                }
                (organization, true)
            }
            OrganizationPlan::Existing(organization_id) => {
                let organization = state
                    .organizations
                    .get(&organization_id)
                    .filter(|organization| organization.is_active && !organization.is_deleted)
                    .cloned()
                    .ok_or_else(|| {
                        AppError::NotFound(format!("organization '{organization_id}' not found"))
                    })?;
                (organization, false)
            }
        };

        if organization_created {
            state
                .organizations
                .insert(organization.id, organization.clone());
        }
        state
            .profiles
            .insert(plan.user_profile.id, plan.user_profile.clone());
        state
            .organization_users
            .insert(plan.organization_user.id, plan.organization_user.clone());
        if let Some(invitation) = &plan.invitation {
            state.invitations.insert(invitation.id, invitation.clone());
        }

        Ok(OrganizationGraph {
            organization,
            organization_user: plan.organization_user,
            user_profile: plan.user_profile,
            role: plan.role,
            invitation: plan.invitation,
            organization_created,
        })
    }

    async fn remove_graph(&self, graph: &OrganizationGraph) -> AppResult<()> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(AppError::Internal("transaction aborted".to_owned()));
        }

        let mut state = self.state.lock().await;
        if let Some(invitation) = &graph.invitation {
            state.invitations.remove(&invitation.id);
        }
        state.organization_users.remove(&graph.organization_user.id);
        state.profiles.remove(&graph.user_profile.id);
        if graph.organization_created {
            state.organizations.remove(&graph.organization.id);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FakeAccount {
    pub email: String,
    pub display_name: String,
    pub claims: Map<String, Value>,
}

/// Identity provider stand-in with switchable failures.
#[derive(Default)]
pub(crate) struct FakeIdentityGateway {
    pub accounts: Mutex<HashMap<String, FakeAccount>>,
    pub tokens: Mutex<HashMap<String, String>>,
    pub fail_create: AtomicBool,
    pub fail_set_claims: AtomicBool,
    pub fail_delete: AtomicBool,
    pub delete_calls: AtomicUsize,
}

impl FakeIdentityGateway {
    pub async fn account_count(&self) -> usize {
        self.accounts.lock().await.len()
    }

    pub async fn issue_token(&self, account_id: &str) -> String {
        let token = format!("token-{}", Uuid::new_v4());
        self.tokens
            .lock()
            .await
            .insert(token.clone(), account_id.to_owned());
        token
    }
}

#[async_trait]
impl IdentityGateway for FakeIdentityGateway {
    async fn create_account(
        &self,
        email: &str,
        _secret: &str,
        display_name: &str,
    ) -> AppResult<String> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(AppError::Dependency("identity provider unavailable".to_owned()));
        }

        let mut accounts = self.accounts.lock().await;
        if accounts.values().any(|account| account.email == email) {
            return Err(AppError::Conflict(format!("account '{email}' already exists")));
        }

        let account_id = format!("acct-{}", Uuid::new_v4());
        accounts.insert(
            account_id.clone(),
            FakeAccount {
                email: email.to_owned(),
                display_name: display_name.to_owned(),
                claims: Map::new(),
            },
        );
        Ok(account_id)
    }

    async fn update_account(
        &self,
        account_id: &str,
        email: Option<&str>,
        display_name: Option<&str>,
    ) -> AppResult<()> {
        let mut accounts = self.accounts.lock().await;
        if let Some(email) = email
            && accounts
                .iter()
                .any(|(id, account)| id != account_id && account.email == email)
        {
            return Err(AppError::Conflict(format!("account '{email}' already exists")));
        }
        let account = accounts
            .get_mut(account_id)
            .ok_or_else(|| AppError::NotFound(format!("account '{account_id}' not found")))?;
        if let Some(email) = email {
            account.email = email.to_owned();
        }
        if let Some(display_name) = display_name {
            account.display_name = display_name.to_owned();
        }
        Ok(())
    }

    async fn delete_account(&self, account_id: &str) -> AppResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AppError::Dependency("identity provider unavailable".to_owned()));
        }
        self.accounts.lock().await.remove(account_id);
        Ok(())
    }

    async fn set_claims(&self, account_id: &str, claims: &Map<String, Value>) -> AppResult<()> {
        if self.fail_set_claims.load(Ordering::SeqCst) {
            return Err(AppError::Dependency("identity provider unavailable".to_owned()));
        }
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .get_mut(account_id)
            .ok_or_else(|| AppError::NotFound(format!("account '{account_id}' not found")))?;
        account.claims = claims.clone();
        Ok(())
    }

    async fn verify_token(&self, token: &str) -> AppResult<VerifiedToken> {
        let account_id = self
            .tokens
            .lock()
            .await
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("invalid token".to_owned()))?;
        let claims = self
            .accounts
            .lock()
            .await
            .get(&account_id)
            .map(|account| account.claims.clone())
            .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_owned()))?;
        Ok(VerifiedToken { account_id, claims })
    }
}

/// Cache store stand-in. Ttl is ignored apart from zero; use `expire_all` to simulate expiry.
#[derive(Default)]
pub(crate) struct FakeCacheStore {
    pub entries: Mutex<HashMap<String, String>>,
    pub fail: AtomicBool,
}

impl FakeCacheStore {
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn expire_all(&self) {
        self.entries.lock().await.clear();
    }

    fn check(&self) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Cache("cache unavailable".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FakeCacheStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.check()?;
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> AppResult<()> {
        self.check()?;
        if ttl_seconds == 0 {
            return Ok(());
        }
        self.entries
            .lock()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.check()?;
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        self.check()?;
        Ok(self
            .entries
            .lock()
            .await
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub(crate) struct RecordingEmailService {
    pub sent: Mutex<Vec<SentEmail>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl EmailService for RecordingEmailService {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        _html_body: Option<&str>,
    ) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("smtp relay refused connection".to_owned()));
        }
        self.sent.lock().await.push(SentEmail {
            to: to.to_owned(),
            subject: subject.to_owned(),
            body: text_body.to_owned(),
        });
        Ok(())
    }
}
