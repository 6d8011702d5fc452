//! HTTP-level tests for `/streaks`.

mod common;

use axum::http::StatusCode;
use chrono::Duration;
use habits_core::streaks::today;
use habits_db::models::streak::NewStreak;
use habits_db::HabitStore;
use habits_events::NotificationKind;
use serde_json::json;
use uuid::Uuid;

async fn complete_on(app: &common::TestApp, user: Uuid, goal: i64, days_ago: i64) {
    let date = today() - Duration::days(days_ago);
    let (status, json) = app
        .post_json(
            "/api/v1/habit-checkins",
            user,
            json!({ "habitGoalId": goal, "scheduledDate": date.to_string() }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
}

#[tokio::test]
async fn by_habit_is_zeroed_before_first_completion() {
    let app = common::build_test_app();
    let user = Uuid::new_v4();
    let goal = app.create_goal(user, "Meditate").await;

    let (status, json) = app.get(&format!("/api/v1/streaks/habit/{goal}"), user).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["currentStreak"], 0);
    assert_eq!(json["data"]["isActive"], false);
    assert_eq!(json["data"]["displayText"], "No streak");
    assert!(json["data"].get("id").is_none());
}

#[tokio::test]
async fn consecutive_days_reach_a_milestone() {
    let app = common::build_test_app();
    let user = Uuid::new_v4();
    let goal = app.create_goal(user, "Walk").await;

    for days_ago in [2, 1, 0] {
        complete_on(&app, user, goal, days_ago).await;
    }

    let (_, streak) = app.get(&format!("/api/v1/streaks/habit/{goal}"), user).await;
    assert_eq!(streak["data"]["currentStreak"], 3);
    assert_eq!(streak["data"]["longestStreak"], 3);
    assert_eq!(streak["data"]["displayText"], "3 days");
    assert_ne!(streak["data"]["riskLevel"], "critical");

    let (_, milestones) = app.get("/api/v1/streaks/milestones", user).await;
    let milestones = milestones["data"].as_array().unwrap();
    assert_eq!(milestones.len(), 1);
    assert_eq!(milestones[0]["milestoneReached"], 3);
    assert_eq!(milestones[0]["eventType"], "milestone_reached");

    let note = app.wait_for(NotificationKind::StreakMilestone).await.unwrap();
    assert_eq!(note.recipient, user);

    let id = streak["data"]["id"].as_i64().unwrap();
    let (status, history) = app
        .get(&format!("/api/v1/streaks/{id}/history?limit=2"), user)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn a_missed_day_restarts_the_count() {
    let app = common::build_test_app();
    let user = Uuid::new_v4();
    let goal = app.create_goal(user, "Stretch").await;

    complete_on(&app, user, goal, 5).await;
    complete_on(&app, user, goal, 4).await;
    complete_on(&app, user, goal, 0).await;

    let (_, streak) = app.get(&format!("/api/v1/streaks/habit/{goal}"), user).await;
    assert_eq!(streak["data"]["currentStreak"], 1);
    assert_eq!(streak["data"]["longestStreak"], 2);

    let id = streak["data"]["id"].as_i64().unwrap();
    let (_, history) = app.get(&format!("/api/v1/streaks/{id}/history"), user).await;
    let missed = history["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|h| h["eventType"] == "missed")
        .count();
    assert_eq!(missed, 1);
}

#[tokio::test]
async fn grace_day_is_spent_once() {
    let mut config = common::test_config();
    config.streak_grace_period_days = 1;
    let app = common::build_test_app_with(config);
    let user = Uuid::new_v4();
    let goal = app.create_goal(user, "Journal").await;
    complete_on(&app, user, goal, 0).await;

    let (_, streak) = app.get(&format!("/api/v1/streaks/habit/{goal}"), user).await;
    let id = streak["data"]["id"].as_i64().unwrap();
    assert_eq!(streak["data"]["gracePeriodDays"], 1);

    let (status, json) = app.put(&format!("/api/v1/streaks/{id}/grace"), user).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["graceDaysUsed"], 1);
    assert_eq!(json["data"]["currentStreak"], 1);

    let (status, json) = app.put(&format!("/api/v1/streaks/{id}/grace"), user).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "No grace days available for this streak");

    let stored = app.store.find_streak(id).await.unwrap().unwrap();
    assert_eq!(stored.grace_days_used, 1);

    let history = app.store.list_streak_history(id, None).await.unwrap();
    assert_eq!(
        history
            .iter()
            .filter(|h| h.event_type.as_str() == "grace_used")
            .count(),
        1
    );
}

#[tokio::test]
async fn grace_without_allowance_changes_nothing() {
    let app = common::build_test_app();
    let user = Uuid::new_v4();
    let goal = app.create_goal(user, "Floss").await;
    let streak = app
        .store
        .create_streak(&NewStreak {
            user_id: user,
            habit_goal_id: goal,
            pact_id: None,
            grace_period_days: 0,
        })
        .await
        .unwrap();

    let (status, _) = app
        .put(&format!("/api/v1/streaks/{}/grace", streak.id), user)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stored = app.store.find_streak(streak.id).await.unwrap().unwrap();
    assert_eq!(stored.grace_days_used, 0);
    assert!(stored.last_grace_date.is_none());
    assert!(app.store.list_streak_history(streak.id, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn streaks_are_private_to_their_owner() {
    let app = common::build_test_app();
    let owner = Uuid::new_v4();
    let goal = app.create_goal(owner, "Run").await;
    complete_on(&app, owner, goal, 0).await;

    let (_, streak) = app.get(&format!("/api/v1/streaks/habit/{goal}"), owner).await;
    let id = streak["data"]["id"].as_i64().unwrap();
    let stranger = Uuid::new_v4();

    let (status, json) = app.get(&format!("/api/v1/streaks/{id}"), stranger).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");

    let (status, _) = app.get(&format!("/api/v1/streaks/{id}/history"), stranger).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.put(&format!("/api/v1/streaks/{id}/grace"), stranger).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get("/api/v1/streaks/999", owner).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn top_ranks_active_streaks_across_users() {
    let app = common::build_test_app();
    let leader = Uuid::new_v4();
    let runner_up = Uuid::new_v4();
    let lead_goal = app.create_goal(leader, "Code").await;
    let other_goal = app.create_goal(runner_up, "Paint").await;

    for days_ago in [1, 0] {
        complete_on(&app, leader, lead_goal, days_ago).await;
    }
    complete_on(&app, runner_up, other_goal, 0).await;

    let (status, json) = app.get("/api/v1/streaks/top?limit=5", runner_up).await;
    assert_eq!(status, StatusCode::OK);
    let top = json["data"].as_array().unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0]["userId"], leader.to_string());
    assert_eq!(top[0]["displayText"], "2 days");
    assert_eq!(top[1]["currentStreak"], 1);

    let (_, mine) = app.get("/api/v1/streaks?isActive=true", runner_up).await;
    assert_eq!(mine["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn grace_day_does_not_bridge_a_long_gap() {
    let mut config = common::test_config();
    config.streak_grace_period_days = 1;
    let app = common::build_test_app_with(config);
    let user = Uuid::new_v4();
    let goal = app.create_goal(user, "Violin").await;
    complete_on(&app, user, goal, 10).await;

    let (_, streak) = app.get(&format!("/api/v1/streaks/habit/{goal}"), user).await;
    let id = streak["data"]["id"].as_i64().unwrap();
    let (status, _) = app.put(&format!("/api/v1/streaks/{id}/grace"), user).await;
    assert_eq!(status, StatusCode::OK);

    complete_on(&app, user, goal, 0).await;

    let stored = app.store.find_streak(id).await.unwrap().unwrap();
    assert_eq!(stored.current_streak, 1);
    assert_eq!(stored.grace_days_used, 0);

    let history = app.store.list_streak_history(id, None).await.unwrap();
    assert_eq!(
        history
            .iter()
            .filter(|h| h.event_type.as_str() == "missed")
            .count(),
        1
    );
}
