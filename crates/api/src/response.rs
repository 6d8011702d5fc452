//! Shared response envelope types for API handlers.
//!
//! Successful responses use a `{ "data": ... }` envelope. Errors use the
//! `{ statusCode, message, code }` envelope rendered by [`crate::error::AppError`].

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: streaks }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Body of successful `DELETE` endpoints.
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}
