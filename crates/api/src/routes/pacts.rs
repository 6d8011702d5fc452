//! Route definitions for `/pacts`.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::pacts;
use crate::state::AppState;

/// Routes mounted at `/pacts`.
///
/// ```text
/// GET    /                  -> list
/// POST   /                  -> create
/// GET    /active            -> list_active
/// GET    /invites           -> list_invites
/// GET    /{id}              -> get_by_id
/// DELETE /{id}              -> delete
/// PUT    /{id}/accept       -> accept
/// PUT    /{id}/decline      -> decline
/// PUT    /{id}/abandon      -> abandon
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(pacts::list).post(pacts::create))
        .route("/active", get(pacts::list_active))
        .route("/invites", get(pacts::list_invites))
        .route("/{id}", get(pacts::get_by_id).delete(pacts::delete))
        .route("/{id}/accept", put(pacts::accept))
        .route("/{id}/decline", put(pacts::decline))
        .route("/{id}/abandon", put(pacts::abandon))
}
