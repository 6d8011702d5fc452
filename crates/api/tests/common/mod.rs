#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use habits_api::config::ServerConfig;
use habits_api::router::build_app_router;
use habits_api::state::AppState;
use habits_db::MemoryStore;
use habits_events::{
    DeliveryError, DeliveryPolicy, Notification, NotificationDispatcher, NotificationKind,
    NotificationSink,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use uuid::Uuid;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: None,
        db_max_connections: 1,
        notification_queue_capacity: 64,
        notification_max_attempts: 1,
        pact_sweep_interval_secs: 3600,
        pact_invitation_expiry_days: 7,
        streak_grace_period_days: 0,
    }
}

/// Records every notification the dispatcher delivers.
#[derive(Default)]
pub struct RecordingSink {
    pub seen: Mutex<Vec<Notification>>,
}

#[async_trait]
impl NotificationSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        self.seen.lock().await.push(notification.clone());
        Ok(())
    }
}

/// The full router over an in-memory store, with a live dispatcher worker
/// feeding a [`RecordingSink`].
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub sink: Arc<RecordingSink>,
    cancel: CancellationToken,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub fn build_test_app() -> TestApp {
    build_test_app_with(test_config())
}

pub fn build_test_app_with(config: ServerConfig) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let sink = Arc::new(RecordingSink::default());
    let sinks: Vec<Arc<dyn NotificationSink>> = vec![sink.clone()];
    let (notifier, worker) = NotificationDispatcher::new(
        config.notification_queue_capacity,
        sinks,
        DeliveryPolicy::default(),
    );
    let cancel = CancellationToken::new();
    tokio::spawn(worker.run(cancel.clone()));

    let state = AppState {
        store: store.clone(),
        notifier,
        config: Arc::new(config.clone()),
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        sink,
        cancel,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: &str,
        path: &str,
        user: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(user) = user {
            builder = builder.header("x-userid", user.to_string());
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, body_json(response).await)
    }

    pub async fn get(&self, path: &str, user: Uuid) -> (StatusCode, Value) {
        self.send("GET", path, Some(user), None).await
    }

    pub async fn post_json(&self, path: &str, user: Uuid, body: Value) -> (StatusCode, Value) {
        self.send("POST", path, Some(user), Some(body)).await
    }

    pub async fn put_json(&self, path: &str, user: Uuid, body: Value) -> (StatusCode, Value) {
        self.send("PUT", path, Some(user), Some(body)).await
    }

    pub async fn put(&self, path: &str, user: Uuid) -> (StatusCode, Value) {
        self.send("PUT", path, Some(user), None).await
    }

    pub async fn delete(&self, path: &str, user: Uuid) -> (StatusCode, Value) {
        self.send("DELETE", path, Some(user), None).await
    }

    /// Create a habit goal owned by `user` and return its id.
    pub async fn create_goal(&self, user: Uuid, name: &str) -> i64 {
        let (status, json) = self
            .post_json("/api/v1/habit-goals", user, serde_json::json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json["data"]["id"].as_i64().unwrap()
    }

    /// Wait until the sink has seen a notification of `kind`, or give up
    /// after two seconds.
    pub async fn wait_for(&self, kind: NotificationKind) -> Option<Notification> {
        for _ in 0..200 {
            let found = self
                .sink
                .seen
                .lock()
                .await
                .iter()
                .find(|n| n.kind == kind)
                .cloned();
            if found.is_some() {
                return found;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        None
    }
}

/// Collect a response body as JSON (`Null` when empty or not JSON).
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}
