//! The notification envelope passed to delivery channels.

use chrono::{DateTime, Utc};
use habits_core::types::UserId;
use serde::{Deserialize, Serialize};

/// What happened, from the recipient's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PactInvitation,
    PactAccepted,
    PactDeclined,
    PactAbandoned,
    PartnerCheckedIn,
    StreakMilestone,
    PactCompleted,
    PactExpired,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PactInvitation => "pact_invitation",
            Self::PactAccepted => "pact_accepted",
            Self::PactDeclined => "pact_declined",
            Self::PactAbandoned => "pact_abandoned",
            Self::PartnerCheckedIn => "partner_checked_in",
            Self::StreakMilestone => "streak_milestone",
            Self::PactCompleted => "pact_completed",
            Self::PactExpired => "pact_expired",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message for one recipient.
///
/// Built with [`Notification::new`] and the `with_*` builders. Channels that
/// need an address the envelope does not carry (e.g. email without
/// `recipient_email`) skip it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub kind: NotificationKind,
    pub recipient: UserId,
    /// The user whose action triggered the notification, if any.
    pub actor: Option<UserId>,
    pub recipient_email: Option<String>,
    pub locale: String,
    pub title: String,
    pub body: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, recipient: UserId, locale: impl Into<String>) -> Self {
        Self {
            kind,
            recipient,
            actor: None,
            recipient_email: None,
            locale: locale.into(),
            title: String::new(),
            body: String::new(),
            payload: serde_json::Value::Object(Default::default()),
            created_at: Utc::now(),
        }
    }

    pub fn with_actor(mut self, actor: UserId) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.recipient_email = email;
        self
    }

    pub fn with_text(mut self, title: impl Into<String>, body: impl Into<String>) -> Self {
        self.title = title.into();
        self.body = body.into();
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}
