//! Route definitions for `/habit-goals`.

use axum::routing::get;
use axum::Router;

use crate::handlers::habit_goals;
use crate::state::AppState;

/// Routes mounted at `/habit-goals`.
///
/// ```text
/// GET    /                  -> list_mine
/// POST   /                  -> create
/// GET    /templates         -> list_templates
/// GET    /public            -> list_public
/// GET    /search            -> search
/// GET    /{id}              -> get_by_id
/// PUT    /{id}              -> update
/// DELETE /{id}              -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(habit_goals::list_mine).post(habit_goals::create))
        .route("/templates", get(habit_goals::list_templates))
        .route("/public", get(habit_goals::list_public))
        .route("/search", get(habit_goals::search))
        .route(
            "/{id}",
            get(habit_goals::get_by_id)
                .put(habit_goals::update)
                .delete(habit_goals::delete),
        )
}
