use serde::{Deserialize, Serialize};

/// Saga states. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningState {
    /// Nothing created yet.
    Start,
    /// External account exists.
    AccountCreated,
    /// Row graph committed.
    GraphCreated,
    /// Custom claims written to the account.
    ClaimsSet,
    /// Provisioning finished.
    Completed,
    /// Provisioning aborted; compensation attempted.
    Failed,
}

impl ProvisioningState {
    /// Returns a stable label for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::AccountCreated => "account_created",
            Self::GraphCreated => "graph_created",
            Self::ClaimsSet => "claims_set",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns whether `next` is a legal successor.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        match (self, next) {
            (Self::Start, Self::AccountCreated)
            | (Self::AccountCreated, Self::GraphCreated)
            | (Self::GraphCreated, Self::ClaimsSet)
            | (Self::ClaimsSet, Self::Completed) => true,
            (current, Self::Failed) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for ProvisioningState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}
