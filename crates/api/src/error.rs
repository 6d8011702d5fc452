use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use habits_core::error::CoreError;
use habits_db::StoreError;
use serde::Serialize;

/// Handler error. Renders as [`ErrorBody`]; store and internal failures are
/// logged in full and reach the client only as a generic 500.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A persistence failure, tagged with the route family it came from.
    #[error("{tag}: {source}")]
    Store {
        tag: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// No route matched the request (`"{method} {path}"`).
    #[error("No route for {0}")]
    RouteNotFound(String),
}

/// The JSON error envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub message: String,
    pub code: &'static str,
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Attach a route tag to store failures.
pub trait StoreResultExt<T> {
    fn tagged(self, tag: &'static str) -> AppResult<T>;
}

impl<T> StoreResultExt<T> for Result<T, StoreError> {
    fn tagged(self, tag: &'static str) -> AppResult<T> {
        self.map_err(|source| AppError::Store { tag, source })
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{field} is invalid"),
                })
            })
            .collect();
        messages.sort();
        AppError::Core(CoreError::Validation(messages.join("; ")))
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Core(core) => core_parts(core),
            AppError::Store { tag, source } => {
                tracing::error!(tag, error = %source, "Store operation failed");
                internal()
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::RouteNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
        }
    }
}

fn core_parts(err: &CoreError) -> (StatusCode, &'static str, String) {
    use CoreError::*;

    match err {
        NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} not found with id {id}"),
        ),
        Validation(m) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", m.clone()),
        InvalidState(m) => (StatusCode::BAD_REQUEST, "INVALID_STATE", m.clone()),
        Exhausted(m) => (StatusCode::BAD_REQUEST, "EXHAUSTED", m.clone()),
        Unauthorized(m) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", m.clone()),
        Forbidden(m) => (StatusCode::FORBIDDEN, "FORBIDDEN", m.clone()),
        Internal(m) => {
            tracing::error!(error = %m, "Internal core error");
            internal()
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = ErrorBody {
            status_code: status.as_u16(),
            message,
            code,
        };
        (status, Json(body)).into_response()
    }
}
