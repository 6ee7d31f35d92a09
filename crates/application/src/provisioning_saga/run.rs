use std::fmt;

use leasewell_core::{AppError, AppResult};
use uuid::Uuid;

use crate::OrganizationGraph;

use super::{ProvisioningKind, ProvisioningState};

/// Journal of one saga execution.
///
/// Holds what still needs undoing; compensation clears each artifact once it
/// is gone, so compensating twice is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningRun {
    run_id: Uuid,
    kind: ProvisioningKind,
    journal: Vec<ProvisioningState>,
    account_id: Option<String>,
    graph: Option<OrganizationGraph>,
}

impl ProvisioningRun {
    pub(crate) fn new(kind: ProvisioningKind) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            kind,
            journal: vec![ProvisioningState::Start],
            account_id: None,
            graph: None,
        }
    }

    /// Returns the run identifier used in logs.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the flow this run executes.
    #[must_use]
    pub fn kind(&self) -> ProvisioningKind {
        self.kind
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> ProvisioningState {
        self.journal
            .last()
            .copied()
            .unwrap_or(ProvisioningState::Start)
    }

    /// Returns every state visited, in order.
    #[must_use]
    pub fn journal(&self) -> &[ProvisioningState] {
        &self.journal
    }

    /// Returns the external account still owned by this run.
    #[must_use]
    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    /// Returns the row graph still owned by this run.
    #[must_use]
    pub fn graph(&self) -> Option<&OrganizationGraph> {
        self.graph.as_ref()
    }

    /// Returns whether nothing remains to undo.
    #[must_use]
    pub fn is_compensated(&self) -> bool {
        self.account_id.is_none() && self.graph.is_none()
    }

    pub(crate) fn advance(&mut self, next: ProvisioningState) -> AppResult<()> {
        let current = self.state();
        if !current.can_transition_to(next) {
            return Err(AppError::Internal(format!(
                "illegal provisioning transition {current} -> {next}"
            )));
        }
        self.journal.push(next);
        Ok(())
    }

    pub(crate) fn record_account(&mut self, account_id: String) -> AppResult<()> {
        self.advance(ProvisioningState::AccountCreated)?;
        self.account_id = Some(account_id);
        Ok(())
    }

    pub(crate) fn record_graph(&mut self, graph: OrganizationGraph) -> AppResult<()> {
        self.advance(ProvisioningState::GraphCreated)?;
        self.graph = Some(graph);
        Ok(())
    }

    pub(crate) fn fail(&mut self) {
        if !self.state().is_terminal() {
            self.journal.push(ProvisioningState::Failed);
        }
    }

    pub(crate) fn release_graph(&mut self) {
        self.graph = None;
    }

    pub(crate) fn release_account(&mut self) {
        self.account_id = None;
    }
}

/// A run that stopped before completing, with whatever it still owns.
///
/// When `run.is_compensated()` is false, pass the run back to
/// [`ProvisioningSaga::compensate`](super::ProvisioningSaga::compensate) to
/// finish cleanup.
#[derive(Debug, Clone)]
pub struct ProvisioningFailure {
    /// Error that stopped the run.
    pub error: AppError,
    /// Journal and residual artifacts.
    pub run: ProvisioningRun,
}

impl ProvisioningFailure {
    /// Failure raised before any remote call; the run owns nothing.
    pub(crate) fn rejected(kind: ProvisioningKind, error: AppError) -> Self {
        let mut run = ProvisioningRun::new(kind);
        run.fail();
        Self { error, run }
    }
}

impl fmt::Display for ProvisioningFailure {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "provisioning run {} failed: {}", self.run.run_id(), self.error)
    }
}

impl std::error::Error for ProvisioningFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<ProvisioningFailure> for AppError {
    fn from(value: ProvisioningFailure) -> Self {
        value.error
    }
}
