//! Push delivery through the notification service webhook.
//!
//! [`PushDelivery`] POSTs the JSON-encoded [`Notification`] to
//! `PUSH_WEBHOOK_URL`. The receiving service resolves device tokens and
//! localizes the text, so only the envelope is sent.

use std::time::Duration;

use async_trait::async_trait;

use super::{DeliveryError, NotificationSink};
use crate::notification::Notification;

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("Push request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The push service answered with a non-2xx status.
    #[error("Push service returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// PushDelivery
// ---------------------------------------------------------------------------

pub struct PushDelivery {
    client: reqwest::Client,
    url: String,
}

impl PushDelivery {
    pub fn new(url: impl Into<String>) -> Result<Self, PushError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// `None` when `PUSH_WEBHOOK_URL` is unset or blank.
    pub fn from_env() -> Option<Result<Self, PushError>> {
        let url = std::env::var("PUSH_WEBHOOK_URL").ok()?;
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        Some(Self::new(url))
    }

    async fn send(&self, notification: &Notification) -> Result<(), PushError> {
        let response = self.client.post(&self.url).json(notification).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PushError::HttpStatus(status.as_u16()));
        }
        tracing::debug!(
            recipient = %notification.recipient,
            kind = %notification.kind,
            "Push notification sent"
        );
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for PushDelivery {
    fn name(&self) -> &'static str {
        "push"
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        Ok(self.send(notification).await?)
    }
}
