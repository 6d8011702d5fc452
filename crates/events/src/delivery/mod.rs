//! Outbound delivery channels.
//!
//! Every channel implements [`NotificationSink`] so the dispatcher can fan a
//! notification out without knowing how each channel talks to the world.

use async_trait::async_trait;

use crate::notification::Notification;

pub mod email;
pub mod push;

/// Failure of a single channel to deliver a notification.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Push(#[from] push::PushError),

    #[error(transparent)]
    Email(#[from] email::EmailError),

    /// Any other channel-specific refusal.
    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Short channel name used in logs.
    fn name(&self) -> &'static str;

    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError>;
}
