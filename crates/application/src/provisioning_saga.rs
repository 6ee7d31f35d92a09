//! Account + row-graph provisioning with compensating rollback.
//!
//! The identity provider and the relational store cannot share a transaction,
//! so every step that succeeds is recorded in a [`ProvisioningRun`] and undone
//! in reverse order when a later step fails.

mod run;
mod state;
mod variant;

use std::sync::Arc;

use leasewell_core::{AppError, AppResult, RequestContext};
use leasewell_domain::{
    CustomClaims, EmailAddress, OrganizationId, OrganizationName, PersonName, RoleId,
    UserProfileId, validate_account_secret,
};
use serde_json::Value;
use tracing::{error, info, warn};

pub use run::{ProvisioningFailure, ProvisioningRun};
pub use state::ProvisioningState;
pub use variant::{NotificationTemplates, ProvisioningKind, ProvisioningVariant};

use crate::{
    AuthorizationEngine, EmailService, IdentityGateway, InvitationSigner, MemberGraphInput,
    OrganizationGraph, OrganizationGraphBuilder, OwnerGraphInput, SessionArtifact, SessionSigner,
    random_hex, sha256_hex,
};

/// Bytes of randomness in a generated secret for invited accounts.
const GENERATED_SECRET_BYTES: usize = 24;

/// Request to onboard a new organization and its owner.
#[derive(Debug, Clone)]
pub struct OnboardOrganizationInput {
    /// Organization display name.
    pub organization_name: String,
    /// Optional ISO country code.
    pub country: Option<String>,
    /// Optional organization settings document.
    pub settings: Option<Value>,
    /// Owner email.
    pub email: String,
    /// Owner first name.
    pub first_name: String,
    /// Owner last name.
    pub last_name: String,
    /// Owner sign-in secret.
    pub secret: String,
}

/// Request to invite a member into an existing organization.
#[derive(Debug, Clone)]
pub struct InviteMemberInput {
    /// Target organization.
    pub organization_id: OrganizationId,
    /// Role to bind; the variant default otherwise.
    pub role_id: Option<RoleId>,
    /// Invitee email.
    pub email: String,
    /// Invitee first name.
    pub first_name: String,
    /// Invitee last name.
    pub last_name: String,
    /// Initial secret; generated when absent.
    pub secret: Option<String>,
}

/// Outcome of a completed provisioning run.
#[derive(Debug, Clone)]
pub struct ProvisioningReceipt {
    /// External account id.
    pub account_id: String,
    /// Persisted rows.
    pub graph: OrganizationGraph,
    /// Claims written to the account.
    pub claims: CustomClaims,
    /// Signed session, owner onboarding only.
    ///
    /// Invited accounts sign in themselves once they accept the invitation.
    pub session: Option<SessionArtifact>,
    /// Raw invitation token, member invitations only.
    pub invitation_token: Option<String>,
    /// Journal of the run.
    pub run: ProvisioningRun,
}

enum GraphRequest {
    Owner(OwnerGraphInput),
    Member {
        input: MemberGraphInput,
        token_hash: String,
    },
}

struct AccountRequest {
    email: EmailAddress,
    name: PersonName,
    secret: String,
}

/// Orchestrates identity provider, row graph and claims.
#[derive(Clone)]
pub struct ProvisioningSaga {
    identity_gateway: Arc<dyn IdentityGateway>,
    graph_builder: OrganizationGraphBuilder,
    authorization_engine: AuthorizationEngine,
    email_service: Arc<dyn EmailService>,
    invitation_signer: InvitationSigner,
    session_signer: SessionSigner,
    frontend_url: String,
}

impl ProvisioningSaga {
    /// Creates a new saga.
    #[must_use]
    pub fn new(
        identity_gateway: Arc<dyn IdentityGateway>,
        graph_builder: OrganizationGraphBuilder,
        authorization_engine: AuthorizationEngine,
        email_service: Arc<dyn EmailService>,
        invitation_signer: InvitationSigner,
        session_signer: SessionSigner,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            identity_gateway,
            graph_builder,
            authorization_engine,
            email_service,
            invitation_signer,
            session_signer,
            frontend_url: frontend_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Onboards a new organization with its owner account.
    ///
    /// A taken organization name fails with `AppError::Conflict` after the
    /// freshly created account has been deleted again.
    pub async fn onboard_organization(
        &self,
        ctx: &RequestContext,
        variant: &ProvisioningVariant,
        input: OnboardOrganizationInput,
    ) -> Result<ProvisioningReceipt, ProvisioningFailure> {
        let (account, graph_request) = prepare_onboarding(variant, input)
            .map_err(|error| ProvisioningFailure::rejected(variant.kind, error))?;

        self.provision(ctx, variant, account, graph_request, None).await
    }

    /// Invites a member into an existing organization.
    ///
    /// The caller must hold `("Member", "Write")` in the organization, and
    /// `("Role", "Write")` as well when naming a role explicitly. No session is
    /// issued for the invitee.
    pub async fn invite_member(
        &self,
        ctx: &RequestContext,
        variant: &ProvisioningVariant,
        input: InviteMemberInput,
    ) -> Result<ProvisioningReceipt, ProvisioningFailure> {
        let (account, graph_request, token) = self
            .prepare_invitation(ctx, variant, input)
            .await
            .map_err(|error| ProvisioningFailure::rejected(variant.kind, error))?;

        self.provision(ctx, variant, account, graph_request, Some(token)).await
    }

    /// Undoes whatever a failed run still owns, newest first.
    ///
    /// Cleanup failures are logged, not returned; a later call retries only the
    /// steps that did not succeed. Completed runs are left untouched.
    pub async fn compensate(&self, ctx: &RequestContext, run: &mut ProvisioningRun) {
        if run.state() == ProvisioningState::Completed {
            return;
        }

        if let Some(graph) = run.graph().cloned() {
            match self.graph_builder.dismantle(&graph).await {
                Ok(()) => run.release_graph(),
                Err(error) => error!(
                    request_id = %ctx.request_id(),
                    run_id = %run.run_id(),
                    organization_id = %graph.organization.id,
                    error = %error,
                    "failed to remove provisioned rows"
                ),
            }
        }

        if let Some(account_id) = run.account_id().map(str::to_owned) {
            match self.identity_gateway.delete_account(&account_id).await {
                Ok(()) => run.release_account(),
                Err(error) => error!(
                    request_id = %ctx.request_id(),
                    run_id = %run.run_id(),
                    account_id = %account_id,
                    error = %error,
                    "failed to delete provisioned account"
                ),
            }
        }
    }

    async fn prepare_invitation(
        &self,
        ctx: &RequestContext,
        variant: &ProvisioningVariant,
        input: InviteMemberInput,
    ) -> AppResult<(AccountRequest, GraphRequest, String)> {
        if variant.kind != ProvisioningKind::MemberInvitation {
            return Err(AppError::Validation(
                "invitations require a member invitation variant".to_owned(),
            ));
        }

        let inviter = UserProfileId::from_uuid(ctx.require_principal()?.subject_profile_id());
        self.authorization_engine
            .require_permission(ctx, inviter, input.organization_id, "Member", "Write")
            .await?;
        if input.role_id.is_some() {
            self.authorization_engine
                .require_permission(ctx, inviter, input.organization_id, "Role", "Write")
                .await?;
        }

        let email = EmailAddress::new(input.email)?;
        let name = PersonName::new(input.first_name, input.last_name)?;
        let secret = match input.secret {
            Some(secret) => secret,
            None => random_hex(GENERATED_SECRET_BYTES)?,
        };
        validate_account_secret(&secret)?;

        let token = self
            .invitation_signer
            .sign(email.as_str(), name.first(), name.last())?;
        let graph_input = MemberGraphInput {
            organization_id: input.organization_id,
            role_id: input.role_id,
            email: email.clone(),
            name: name.clone(),
            invited_by: Some(inviter),
        };
        let token_hash = sha256_hex(&token);

        Ok((
            AccountRequest {
                email,
                name,
                secret,
            },
            GraphRequest::Member {
                input: graph_input,
                token_hash,
            },
            token,
        ))
    }

    async fn provision(
        &self,
        ctx: &RequestContext,
        variant: &ProvisioningVariant,
        account: AccountRequest,
        graph_request: GraphRequest,
        invitation_token: Option<String>,
    ) -> Result<ProvisioningReceipt, ProvisioningFailure> {
        let mut run = ProvisioningRun::new(variant.kind);
        info!(
            request_id = %ctx.request_id(),
            run_id = %run.run_id(),
            kind = ?variant.kind,
            "provisioning started"
        );

        let account_id = match self
            .identity_gateway
            .create_account(
                account.email.as_str(),
                &account.secret,
                &account.name.display_name(),
            )
            .await
        {
            Ok(account_id) => account_id,
            Err(error) => return Err(self.abort(ctx, run, error).await),
        };
        if let Err(error) = run.record_account(account_id.clone()) {
            return Err(self.abort(ctx, run, error).await);
        }
        log_transition(ctx, &run);

        let graph = match self.build_graph(&graph_request, &account_id, variant).await {
            Ok(graph) => graph,
            Err(error) => return Err(self.abort(ctx, run, error).await),
        };
        if let Err(error) = run.record_graph(graph.clone()) {
            return Err(self.abort(ctx, run, error).await);
        }
        log_transition(ctx, &run);

        let claims = CustomClaims {
            subject_profile_id: graph.user_profile.id,
            organization_role: graph.role.name.clone(),
            organization_id: graph.organization.id,
            tenant_id: graph.organization.tenant_id.clone(),
        };
        let session = match self.write_claims(variant, &account_id, &claims).await {
            Ok(session) => session,
            Err(error) => return Err(self.abort(ctx, run, error).await),
        };
        if let Err(error) = run.advance(ProvisioningState::ClaimsSet) {
            return Err(self.abort(ctx, run, error).await);
        }
        log_transition(ctx, &run);

        self.notify(ctx, variant, &account, &graph, invitation_token.as_deref())
            .await;
        if let Err(error) = run.advance(ProvisioningState::Completed) {
            return Err(self.abort(ctx, run, error).await);
        }
        log_transition(ctx, &run);

        Ok(ProvisioningReceipt {
            account_id,
            graph,
            claims,
            session,
            invitation_token,
            run,
        })
    }

    async fn build_graph(
        &self,
        request: &GraphRequest,
        account_id: &str,
        variant: &ProvisioningVariant,
    ) -> AppResult<OrganizationGraph> {
        match request {
            GraphRequest::Owner(input) => {
                self.graph_builder
                    .build_owner_graph(input, account_id, &variant.default_role_name)
                    .await
            }
            GraphRequest::Member { input, token_hash } => {
                self.graph_builder
                    .build_member_graph(
                        input,
                        account_id,
                        &variant.default_role_name,
                        token_hash.clone(),
                    )
                    .await
            }
        }
    }

    async fn write_claims(
        &self,
        variant: &ProvisioningVariant,
        account_id: &str,
        claims: &CustomClaims,
    ) -> AppResult<Option<SessionArtifact>> {
        let session = match variant.kind {
            ProvisioningKind::OwnerOnboarding => {
                Some(self.session_signer.issue(account_id, claims)?)
            }
            ProvisioningKind::MemberInvitation => None,
        };
        self.identity_gateway
            .set_claims(account_id, &claims.to_map()?)
            .await?;
        Ok(session)
    }

    async fn notify(
        &self,
        ctx: &RequestContext,
        variant: &ProvisioningVariant,
        account: &AccountRequest,
        graph: &OrganizationGraph,
        invitation_token: Option<&str>,
    ) {
        let link = match invitation_token {
            Some(token) => format!("{}/invitations/{token}", self.frontend_url),
            None => format!("{}/login", self.frontend_url),
        };
        let (subject, body) = variant.templates.render(
            &account.name.display_name(),
            &graph.organization.name,
            &link,
        );

        if let Err(error) = self
            .email_service
            .send_email(account.email.as_str(), &subject, &body, None)
            .await
        {
            warn!(
                request_id = %ctx.request_id(),
                profile_id = %graph.user_profile.id,
                error = %error,
                "provisioning notification failed"
            );
        }
    }

    async fn abort(
        &self,
        ctx: &RequestContext,
        mut run: ProvisioningRun,
        error: AppError,
    ) -> ProvisioningFailure {
        let failed_in = run.state();
        run.fail();
        warn!(
            request_id = %ctx.request_id(),
            run_id = %run.run_id(),
            state = %failed_in,
            error = %error,
            "provisioning failed, compensating"
        );
        self.compensate(ctx, &mut run).await;
        ProvisioningFailure { error, run }
    }
}

fn prepare_onboarding(
    variant: &ProvisioningVariant,
    input: OnboardOrganizationInput,
) -> AppResult<(AccountRequest, GraphRequest)> {
    if variant.kind != ProvisioningKind::OwnerOnboarding {
        return Err(AppError::Validation(
            "onboarding requires an owner onboarding variant".to_owned(),
        ));
    }

    let email = EmailAddress::new(input.email)?;
    let name = PersonName::new(input.first_name, input.last_name)?;
    validate_account_secret(&input.secret)?;
    let graph_input = OwnerGraphInput {
        organization_name: OrganizationName::new(input.organization_name)?,
        country: normalize_country(input.country)?,
        settings: input.settings,
        email: email.clone(),
        name: name.clone(),
    };

    Ok((
        AccountRequest {
            email,
            name,
            secret: input.secret,
        },
        GraphRequest::Owner(graph_input),
    ))
}

fn log_transition(ctx: &RequestContext, run: &ProvisioningRun) {
    info!(
        request_id = %ctx.request_id(),
        run_id = %run.run_id(),
        state = %run.state(),
        "provisioning advanced"
    );
}

fn normalize_country(country: Option<String>) -> AppResult<Option<String>> {
    let Some(country) = country else {
        return Ok(None);
    };
    let country = country.trim().to_ascii_uppercase();
    if country.is_empty() {
        return Ok(None);
    }
    if country.len() != 2 || !country.chars().all(|character| character.is_ascii_uppercase()) {
        return Err(AppError::Validation(format!(
            "country '{country}' must be a two-letter ISO code"
        )));
    }
    Ok(Some(country))
}
