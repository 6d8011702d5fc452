//! Route definitions for `/habit-checkins`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::habit_checkins;
use crate::state::AppState;

/// Routes mounted at `/habit-checkins`.
///
/// ```text
/// POST   /                  -> create
/// GET    /today             -> list_today
/// GET    /range             -> list_range
/// GET    /pact/{pact_id}    -> list_for_pact
/// GET    /{id}              -> get_by_id
/// PUT    /{id}              -> update
/// DELETE /{id}              -> delete
/// PUT    /{id}/skip         -> skip
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(habit_checkins::create))
        .route("/today", get(habit_checkins::list_today))
        .route("/range", get(habit_checkins::list_range))
        .route("/pact/{pact_id}", get(habit_checkins::list_for_pact))
        .route(
            "/{id}",
            get(habit_checkins::get_by_id)
                .put(habit_checkins::update)
                .delete(habit_checkins::delete),
        )
        .route("/{id}/skip", put(habit_checkins::skip))
}
