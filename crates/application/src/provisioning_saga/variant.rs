/// Which flow a variant drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningKind {
    /// New tenant plus owner account.
    OwnerOnboarding,
    /// New member of an existing tenant.
    MemberInvitation,
}

/// Notification text with `{name}`, `{organization}` and `{link}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTemplates {
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

impl NotificationTemplates {
    /// Creates a template set.
    #[must_use]
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Fills the placeholders and returns `(subject, body)`.
    #[must_use]
    pub fn render(&self, name: &str, organization: &str, link: &str) -> (String, String) {
        let fill = |template: &str| {
            template
                .replace("{name}", name)
                .replace("{organization}", organization)
                .replace("{link}", link)
        };
        (fill(&self.subject), fill(&self.body))
    }
}

/// Configuration that selects one provisioning flow at call time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningVariant {
    /// Flow this variant drives.
    pub kind: ProvisioningKind,
    /// Notification sent on completion.
    pub templates: NotificationTemplates,
    /// Role bound when the caller supplies none.
    pub default_role_name: String,
}

impl ProvisioningVariant {
    /// Owner onboarding bound to the `owner` role with a verification email.
    #[must_use]
    pub fn owner_onboarding() -> Self {
        Self {
            kind: ProvisioningKind::OwnerOnboarding,
            templates: NotificationTemplates::new(
                "Verify your {organization} account",
                "Hi {name},\n\n{organization} is ready. Sign in to verify your email:\n\n{link}\n",
            ),
            default_role_name: "owner".to_owned(),
        }
    }

    /// Member invitation bound to the `member` role unless the inviter picks one.
    #[must_use]
    pub fn member_invitation() -> Self {
        Self {
            kind: ProvisioningKind::MemberInvitation,
            templates: NotificationTemplates::new(
                "You have been invited to {organization}",
                "Hi {name},\n\nYou have been invited to join {organization}. Accept the invitation here:\n\n{link}\n",
            ),
            default_role_name: "member".to_owned(),
        }
    }

    /// Replaces the default role.
    #[must_use]
    pub fn with_default_role(mut self, role_name: impl Into<String>) -> Self {
        self.default_role_name = role_name.into();
        self
    }
}
