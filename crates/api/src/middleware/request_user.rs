//! Caller identity extractor.
//!
//! Authentication happens upstream. The gateway forwards the user id in
//! `x-userid`, the locale in `x-localecode` and, when known, the account
//! email in `x-user-email`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use habits_core::error::CoreError;
use habits_core::types::UserId;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-userid";
pub const LOCALE_HEADER: &str = "x-localecode";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

pub const DEFAULT_LOCALE: &str = "en-us";

/// The user making the request.
///
/// ```ignore
/// async fn my_handler(user: RequestUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %user.user_id, locale = %user.locale, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequestUser {
    pub user_id: UserId,
    pub locale: String,
    pub email: Option<String>,
}

impl FromRequestParts<AppState> for RequestUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let raw_id = header(USER_ID_HEADER).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Missing x-userid header".into()))
        })?;
        let user_id = Uuid::parse_str(raw_id).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid x-userid header".into()))
        })?;

        let locale = header(LOCALE_HEADER)
            .map(str::to_lowercase)
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());
        let email = header(USER_EMAIL_HEADER).map(str::to_string);

        Ok(RequestUser {
            user_id,
            locale,
            email,
        })
    }
}
