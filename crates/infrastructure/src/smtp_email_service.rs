//! SMTP delivery through `lettre`.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use leasewell_application::EmailService;
use leasewell_core::{AppError, AppResult};

/// SMTP relay settings.
#[derive(Clone)]
pub struct SmtpEmailConfig {
    /// Relay hostname.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Relay username.
    pub username: String,
    /// Relay password.
    pub password: String,
    /// Sender address, e.g. `Leasewell <no-reply@leasewell.app>`.
    pub from_address: String,
}

/// Delivers provisioning emails over an authenticated SMTP relay.
#[derive(Clone)]
pub struct SmtpEmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailService {
    /// Builds the relay transport once; fails on an invalid host or sender.
    pub fn new(config: SmtpEmailConfig) -> AppResult<Self> {
        let from = config
            .from_address
            .parse()
            .map_err(|error| AppError::Validation(format!("invalid SMTP sender: {error}")))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|error| {
                AppError::Validation(format!("invalid SMTP relay '{}': {error}", config.host))
            })?
            .port(config.port)
            .credentials(Credentials::new(config.username, config.password))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl EmailService for SmtpEmailService {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: Option<&str>,
    ) -> AppResult<()> {
        let recipient: Mailbox = to
            .parse()
            .map_err(|error| AppError::Validation(format!("invalid recipient '{to}': {error}")))?;

        let builder = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject);

        let message = match html_body {
            Some(html_body) => builder.multipart(MultiPart::alternative_plain_html(
                text_body.to_owned(),
                html_body.to_owned(),
            )),
            None => builder.singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body(text_body.to_owned()),
            ),
        }
        .map_err(|error| AppError::Internal(format!("failed to build email: {error}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|error| AppError::Dependency(format!("SMTP delivery failed: {error}")))?;

        Ok(())
    }
}
