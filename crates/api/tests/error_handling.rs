//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server needed.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use habits_api::error::{AppError, StoreResultExt};
use habits_core::error::CoreError;
use habits_db::StoreError;
use http_body_util::BodyExt;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let (status, json) = error_to_response(CoreError::not_found("Pact", 42).into()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["statusCode"], 404);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["message"], "Pact not found with id 42");
}

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::Validation("habitGoalId is required".into()));
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["message"], "habitGoalId is required");
}

#[tokio::test]
async fn invalid_state_and_exhausted_return_400() {
    let (status, json) =
        error_to_response(CoreError::InvalidState("Pact is not pending".into()).into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_STATE");

    let (status, json) =
        error_to_response(CoreError::Exhausted("No grace days".into()).into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "EXHAUSTED");
}

#[tokio::test]
async fn forbidden_and_unauthorized() {
    let (status, json) = error_to_response(
        CoreError::Forbidden("You are not a participant in this pact".into()).into(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
    assert_eq!(json["message"], "You are not a participant in this pact");

    let (status, json) =
        error_to_response(CoreError::Unauthorized("Missing x-userid header".into()).into()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["statusCode"], 401);
}

#[tokio::test]
async fn store_error_is_sanitized() {
    let failed: Result<(), StoreError> = Err(StoreError::Database(sqlx::Error::PoolTimedOut));
    let err = failed.tagged("SQL:PACTS_ROUTES:ERROR").unwrap_err();
    assert!(err.to_string().starts_with("SQL:PACTS_ROUTES:ERROR"));

    let (status, json) = error_to_response(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["message"], "An internal error occurred");
}

#[tokio::test]
async fn bad_request_error_returns_400() {
    let (status, json) = error_to_response(AppError::BadRequest("bad body".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["message"], "bad body");
}
