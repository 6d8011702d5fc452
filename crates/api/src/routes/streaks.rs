//! Route definitions for `/streaks`.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::streaks;
use crate::state::AppState;

/// Routes mounted at `/streaks`.
///
/// ```text
/// GET    /                          -> list
/// GET    /active                    -> list_active
/// GET    /milestones                -> list_milestones
/// GET    /top                       -> list_top
/// GET    /habit/{habit_goal_id}     -> get_by_habit
/// GET    /pact/{pact_id}            -> list_for_pact
/// GET    /{id}                      -> get_by_id
/// GET    /{id}/history              -> list_history
/// PUT    /{id}/grace                -> use_grace_day
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(streaks::list))
        .route("/active", get(streaks::list_active))
        .route("/milestones", get(streaks::list_milestones))
        .route("/top", get(streaks::list_top))
        .route("/habit/{habit_goal_id}", get(streaks::get_by_habit))
        .route("/pact/{pact_id}", get(streaks::list_for_pact))
        .route("/{id}", get(streaks::get_by_id))
        .route("/{id}/history", get(streaks::list_history))
        .route("/{id}/grace", put(streaks::use_grace_day))
}
