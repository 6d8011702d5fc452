use std::sync::Arc;

use habits_db::HabitStore;
use habits_events::NotificationDispatcher;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc` or is a channel handle.
#[derive(Clone)]
pub struct AppState {
    /// Persistence port (PostgreSQL in production, in-memory in tests).
    pub store: Arc<dyn HabitStore>,
    /// Non-blocking notification queue.
    pub notifier: NotificationDispatcher,
    pub config: Arc<ServerConfig>,
}
