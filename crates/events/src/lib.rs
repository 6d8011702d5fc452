//! Notification fan-out for pact and streak events.
//!
//! - [`Notification`] -- the envelope handed to every channel.
//! - [`NotificationDispatcher`] -- bounded, non-blocking queue drained by a
//!   single background [`DispatchWorker`].
//! - [`delivery`] -- outbound channels (push webhook, SMTP email).

pub mod delivery;
pub mod dispatcher;
pub mod notification;

pub use delivery::email::{EmailConfig, EmailDelivery};
pub use delivery::push::PushDelivery;
pub use delivery::{DeliveryError, NotificationSink};
pub use dispatcher::{DeliveryPolicy, DispatchWorker, NotificationDispatcher};
pub use notification::{Notification, NotificationKind};
