//! Bounded background queue for notifications.
//!
//! Request handlers call [`NotificationDispatcher::enqueue`], which never
//! waits: a full queue drops the notification with a warning. A single
//! [`DispatchWorker`] drains the queue and fans each notification out to
//! every configured [`NotificationSink`]. Channel failures are logged and
//! retried only as far as [`DeliveryPolicy::max_attempts`] allows.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::delivery::NotificationSink;
use crate::notification::Notification;

/// Default queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Retry policy applied per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPolicy {
    /// Total attempts per channel; `1` means never retried.
    pub max_attempts: u32,
    /// Pause between attempts, multiplied by the attempt number.
    pub retry_delay: Duration,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            retry_delay: Duration::from_secs(1),
        }
    }
}

// ---------------------------------------------------------------------------
// NotificationDispatcher
// ---------------------------------------------------------------------------

/// Cheaply cloneable handle used by request handlers.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::Sender<Notification>,
}

impl NotificationDispatcher {
    /// Create the handle and the worker that must be spawned to drain it.
    pub fn new(
        capacity: usize,
        sinks: Vec<Arc<dyn NotificationSink>>,
        policy: DeliveryPolicy,
    ) -> (Self, DispatchWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let worker = DispatchWorker {
            receiver,
            sinks,
            policy,
        };
        (Self { sender }, worker)
    }

    /// Queue a notification without waiting. Returns `false` if it was dropped.
    pub fn enqueue(&self, notification: Notification) -> bool {
        match self.sender.try_send(notification) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(n)) => {
                tracing::warn!(
                    kind = %n.kind,
                    recipient = %n.recipient,
                    "Notification queue full, dropping notification"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(n)) => {
                tracing::warn!(
                    kind = %n.kind,
                    recipient = %n.recipient,
                    "Notification worker stopped, dropping notification"
                );
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// DispatchWorker
// ---------------------------------------------------------------------------

pub struct DispatchWorker {
    receiver: mpsc::Receiver<Notification>,
    sinks: Vec<Arc<dyn NotificationSink>>,
    policy: DeliveryPolicy,
}

impl DispatchWorker {
    /// Deliver queued notifications until `cancel` fires, then drain what is
    /// already queued and return.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!(
            channels = self.sinks.len(),
            max_attempts = self.policy.max_attempts,
            "Notification worker started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                next = self.receiver.recv() => match next {
                    Some(notification) => self.dispatch(&notification).await,
                    None => break,
                },
            }
        }

        self.receiver.close();
        let mut drained = 0usize;
        while let Some(notification) = self.receiver.recv().await {
            self.dispatch(&notification).await;
            drained += 1;
        }
        tracing::info!(drained, "Notification worker stopped");
    }

    async fn dispatch(&self, notification: &Notification) {
        for sink in &self.sinks {
            deliver_with_policy(sink.as_ref(), notification, self.policy).await;
        }
    }
}

/// Try one channel up to `policy.max_attempts` times. Never returns an error.
async fn deliver_with_policy(
    sink: &dyn NotificationSink,
    notification: &Notification,
    policy: DeliveryPolicy,
) -> bool {
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        match sink.deliver(notification).await {
            Ok(()) => return true,
            Err(e) if attempt < attempts => {
                tracing::warn!(
                    channel = sink.name(),
                    kind = %notification.kind,
                    attempt,
                    error = %e,
                    "Notification delivery failed, retrying"
                );
                tokio::time::sleep(policy.retry_delay * attempt).await;
            }
            Err(e) => {
                tracing::error!(
                    channel = sink.name(),
                    kind = %notification.kind,
                    recipient = %notification.recipient,
                    attempts,
                    error = %e,
                    "Notification delivery failed"
                );
            }
        }
    }
    false
}
