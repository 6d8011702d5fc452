//! HTTP-level tests for `/habit-checkins`.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn completed_checkin_starts_a_streak() {
    let app = common::build_test_app();
    let user = Uuid::new_v4();
    let goal = app.create_goal(user, "Meditate").await;

    let (status, json) = app
        .post_json("/api/v1/habit-checkins", user, json!({ "habitGoalId": goal }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    assert_eq!(json["data"]["status"], "completed");
    assert_eq!(json["data"]["contributedToStreak"], true);
    assert!(json["data"]["completedAt"].is_string());

    let (status, streak) = app.get(&format!("/api/v1/streaks/habit/{goal}"), user).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(streak["data"]["currentStreak"], 1);
    assert_eq!(streak["data"]["displayText"], "1 day");

    let streak_id = streak["data"]["id"].as_i64().unwrap();
    let (_, history) = app
        .get(&format!("/api/v1/streaks/{streak_id}/history"), user)
        .await;
    let rows = history["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["eventType"], "completed");
    assert_eq!(rows[0]["streakBefore"], 0);
    assert_eq!(rows[0]["streakAfter"], 1);
}

#[tokio::test]
async fn repeated_create_updates_the_same_row() {
    let app = common::build_test_app();
    let user = Uuid::new_v4();
    let goal = app.create_goal(user, "Stretch").await;
    let body = json!({ "habitGoalId": goal, "scheduledDate": "2026-04-02", "notes": "first" });

    let (_, first) = app.post_json("/api/v1/habit-checkins", user, body).await;
    let (status, second) = app
        .post_json(
            "/api/v1/habit-checkins",
            user,
            json!({ "habitGoalId": goal, "scheduledDate": "2026-04-02", "notes": "second" }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["data"]["id"], second["data"]["id"]);
    assert_eq!(second["data"]["notes"], "second");

    let (_, range) = app
        .get(
            "/api/v1/habit-checkins/range?startDate=2026-04-01&endDate=2026-04-30",
            user,
        )
        .await;
    assert_eq!(range["data"].as_array().unwrap().len(), 1);

    let (_, streak) = app.get(&format!("/api/v1/streaks/habit/{goal}"), user).await;
    assert_eq!(streak["data"]["currentStreak"], 1);
}

#[tokio::test]
async fn create_validates_input() {
    let app = common::build_test_app();
    let user = Uuid::new_v4();
    let goal = app.create_goal(user, "Run").await;

    let (status, json) = app
        .post_json("/api/v1/habit-checkins", user, json!({ "notes": "no goal" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "habitGoalId is required");

    let (status, _) = app
        .post_json(
            "/api/v1/habit-checkins",
            user,
            json!({ "habitGoalId": goal, "selfRating": 9 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json(
            "/api/v1/habit-checkins",
            user,
            json!({ "habitGoalId": goal, "status": "done" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = app
        .post_json("/api/v1/habit-checkins", user, json!({ "habitGoalId": 9999 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Habit goal not found with id 9999");
}

#[tokio::test]
async fn pending_checkin_does_not_touch_streaks() {
    let app = common::build_test_app();
    let user = Uuid::new_v4();
    let goal = app.create_goal(user, "Journal").await;

    let (status, json) = app
        .post_json(
            "/api/v1/habit-checkins",
            user,
            json!({ "habitGoalId": goal, "status": "pending" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(json["data"]["completedAt"].is_null());
    assert_eq!(json["data"]["contributedToStreak"], false);

    let (_, streak) = app.get(&format!("/api/v1/streaks/habit/{goal}"), user).await;
    assert_eq!(streak["data"]["currentStreak"], 0);
    assert_eq!(streak["data"]["riskLevel"], "safe");

    // First transition into completed stamps completedAt.
    let id = json["data"]["id"].as_i64().unwrap();
    let (status, updated) = app
        .put_json(
            &format!("/api/v1/habit-checkins/{id}"),
            user,
            json!({ "status": "completed", "selfRating": 4 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(updated["data"]["completedAt"].is_string());
    assert_eq!(updated["data"]["selfRating"], 4);
}

#[tokio::test]
async fn ownership_is_enforced() {
    let app = common::build_test_app();
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let goal = app.create_goal(owner, "Walk").await;

    let (_, json) = app
        .post_json("/api/v1/habit-checkins", owner, json!({ "habitGoalId": goal }))
        .await;
    let id = json["data"]["id"].as_i64().unwrap();

    let (status, json) = app.get(&format!("/api/v1/habit-checkins/{id}"), stranger).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["message"], "Not authorized to view this checkin");

    let (status, json) = app
        .put_json(&format!("/api/v1/habit-checkins/{id}/skip"), stranger, json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["message"], "Not authorized to update this checkin");

    let (status, _) = app.delete(&format!("/api/v1/habit-checkins/{id}"), stranger).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = app.delete(&format!("/api/v1/habit-checkins/{id}"), owner).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["deleted"], true);
}

#[tokio::test]
async fn skip_marks_checkin_without_streak_credit() {
    let app = common::build_test_app();
    let user = Uuid::new_v4();
    let goal = app.create_goal(user, "Floss").await;

    let (_, json) = app
        .post_json(
            "/api/v1/habit-checkins",
            user,
            json!({ "habitGoalId": goal, "status": "pending" }),
        )
        .await;
    let id = json["data"]["id"].as_i64().unwrap();

    let (status, skipped) = app
        .put_json(
            &format!("/api/v1/habit-checkins/{id}/skip"),
            user,
            json!({ "notes": "travelling" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(skipped["data"]["status"], "skipped");
    assert_eq!(skipped["data"]["notes"], "travelling");
    assert_eq!(skipped["data"]["contributedToStreak"], false);
}

#[tokio::test]
async fn range_requires_both_dates() {
    let app = common::build_test_app();
    let user = Uuid::new_v4();

    let (status, json) = app
        .get("/api/v1/habit-checkins/range?startDate=2026-01-01", user)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "startDate and endDate are required");

    let (status, _) = app
        .get(
            "/api/v1/habit-checkins/range?startDate=yesterday&endDate=2026-01-02",
            user,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn today_lists_only_todays_checkins() {
    let app = common::build_test_app();
    let user = Uuid::new_v4();
    let goal = app.create_goal(user, "Water").await;

    app.post_json("/api/v1/habit-checkins", user, json!({ "habitGoalId": goal }))
        .await;
    app.post_json(
        "/api/v1/habit-checkins",
        user,
        json!({ "habitGoalId": goal, "scheduledDate": "2020-01-01" }),
    )
    .await;

    let (status, json) = app
        .get(&format!("/api/v1/habit-checkins/today?habitGoalId={goal}"), user)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}
