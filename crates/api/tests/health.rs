//! Health endpoint and caller identity checks.

mod common;

use axum::http::StatusCode;
use uuid::Uuid;

#[tokio::test]
async fn health_reports_store_status() {
    let app = common::build_test_app();
    let (status, json) = app.send("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["storeHealthy"], true);
}

#[tokio::test]
async fn missing_user_header_is_401() {
    let app = common::build_test_app();
    let (status, json) = app.send("GET", "/api/v1/streaks", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Missing x-userid header");
}

#[tokio::test]
async fn malformed_user_header_is_401() {
    let app = common::build_test_app();
    let request = axum::http::Request::builder()
        .uri("/api/v1/pacts")
        .header("x-userid", "not-a-uuid")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = common::build_test_app();
    let request = axum::http::Request::builder()
        .uri("/api/v1/streaks")
        .header("x-userid", Uuid::new_v4().to_string())
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let app = common::build_test_app();
    let (status, json) = app.get("/api/v1/nope", uuid::Uuid::new_v4()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["message"], "No route for GET /api/v1/nope");
}
