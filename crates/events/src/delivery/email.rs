//! SMTP sink. One transport is built up front and reused for every
//! message; notifications without a `recipient_email` are skipped.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{DeliveryError, NotificationSink};
use crate::notification::Notification;

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(#[from] lettre::error::Error),
}

const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_FROM_ADDRESS: &str = "noreply@therr.local";
const SUBJECT_PREFIX: &str = "[Therr]";

/// SMTP settings.
///
/// | Variable        | Required | Default               |
/// |-----------------|----------|-----------------------|
/// | `SMTP_HOST`     | yes      | -                     |
/// | `SMTP_PORT`     | no       | `587`                 |
/// | `SMTP_FROM`     | no       | `noreply@therr.local` |
/// | `SMTP_USER`     | no       | -                     |
/// | `SMTP_PASSWORD` | no       | -                     |
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: String,
    /// Username and password; only used when both are set.
    pub credentials: Option<(String, String)>,
}

impl EmailConfig {
    /// `None` when `SMTP_HOST` is unset, which disables email entirely.
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let smtp_host = var("SMTP_HOST")?;
        let smtp_port = var("SMTP_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_SMTP_PORT);
        let from_address = var("SMTP_FROM").unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string());
        let credentials = var("SMTP_USER").zip(var("SMTP_PASSWORD"));

        Some(Self {
            smtp_host,
            smtp_port,
            from_address,
            credentials,
        })
    }
}

#[derive(Debug)]
pub struct EmailDelivery {
    from: lettre::message::Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailDelivery {
    /// Validate the sender address and build the STARTTLS transport.
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);
        if let Some((user, password)) = config.credentials {
            builder = builder.credentials(Credentials::new(user, password));
        }

        Ok(Self {
            from: config.from_address.parse()?,
            transport: builder.build(),
        })
    }

    fn subject(notification: &Notification) -> String {
        if notification.title.is_empty() {
            format!("{SUBJECT_PREFIX} {}", notification.kind)
        } else {
            format!("{SUBJECT_PREFIX} {}", notification.title)
        }
    }

    fn message(&self, to: &str, notification: &Notification) -> Result<Message, EmailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(Self::subject(notification))
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())?;
        Ok(message)
    }

    pub async fn send(&self, to: &str, notification: &Notification) -> Result<(), EmailError> {
        let message = self.message(to, notification)?;
        self.transport.send(message).await?;
        tracing::info!(to, kind = %notification.kind, "Notification email sent");
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for EmailDelivery {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let Some(to) = notification.recipient_email.as_deref() else {
            tracing::debug!(
                recipient = %notification.recipient,
                kind = %notification.kind,
                "No email address for recipient, skipping"
            );
            return Ok(());
        };
        Ok(self.send(to, notification).await?)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use uuid::Uuid;

    use super::*;
    use crate::notification::NotificationKind;

    fn config() -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.invalid".to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            from_address: DEFAULT_FROM_ADDRESS.to_string(),
            credentials: None,
        }
    }

    #[test]
    fn subject_prefers_title() {
        let n = Notification::new(NotificationKind::StreakMilestone, Uuid::new_v4(), "en-us");
        assert_eq!(EmailDelivery::subject(&n), "[Therr] streak_milestone");

        let n = n.with_text("7 day streak!", "Keep going");
        assert_eq!(EmailDelivery::subject(&n), "[Therr] 7 day streak!");
    }

    #[tokio::test]
    async fn bad_sender_is_rejected_up_front() {
        let config = EmailConfig {
            from_address: "nobody".to_string(),
            ..config()
        };
        assert_matches!(EmailDelivery::new(config), Err(EmailError::Address(_)));
    }

    #[tokio::test]
    async fn skips_without_address() {
        let mailer = EmailDelivery::new(config()).unwrap();
        let n = Notification::new(NotificationKind::PactAccepted, Uuid::new_v4(), "en-us");
        assert!(mailer.deliver(&n).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_bad_recipient() {
        let mailer = EmailDelivery::new(config()).unwrap();
        let n = Notification::new(NotificationKind::PactAccepted, Uuid::new_v4(), "en-us")
            .with_email(Some("not-an-email".to_string()));
        let err = mailer.deliver(&n).await.unwrap_err();
        assert!(err.to_string().contains("Email address parse error"));
    }
}
