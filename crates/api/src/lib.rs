//! Habit streak and pact accountability API.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! background jobs) so the binary and the integration tests share them.

pub mod background;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notifications;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
