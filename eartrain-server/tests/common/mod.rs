//! Shared helpers for the API integration tests
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use eartrain_common::auth::TokenService;
use eartrain_common::config::{ConfigOverrides, ServerConfig, TomlConfig};
use eartrain_common::db::init_database;
use eartrain_server::mailer::{LogMailer, OutgoingMail};
use eartrain_server::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

pub const TEST_SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "correct horse battery";

/// Router over a fresh database in a temporary directory
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub mailer: Arc<LogMailer>,
    _dir: TempDir,
}

pub async fn setup() -> TestApp {
    setup_with(|state| state).await
}

/// Like [`setup`] but lets the test adjust the state first
pub async fn setup_with(customize: impl FnOnce(AppState) -> AppState) -> TestApp {
    let dir = TempDir::new().expect("Should create temp dir");
    let db = init_database(&dir.path().join("eartrain-test.db"))
        .await
        .expect("Should initialize test database");
    let config = ServerConfig::resolve(&ConfigOverrides::default(), &TomlConfig::default())
        .expect("Default config should resolve");

    let mailer = Arc::new(LogMailer::new());
    let state = AppState::new(db, TokenService::new(TEST_SECRET), config)
        .with_mailer(mailer.clone());
    let state = customize(state);

    TestApp {
        app: build_router(state.clone()),
        state,
        mailer,
        _dir: dir,
    }
}

/// Response status, headers and JSON body (`Null` when empty)
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Should read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Should parse JSON")
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request("GET", uri, token, None)).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(request("POST", uri, token, Some(body))).await
    }

    /// Register an account and return (token, user id)
    pub async fn register(&self, email: &str, name: &str) -> (String, String) {
        let response = self
            .post(
                "/api/auth/register",
                None,
                json!({ "email": email, "password": PASSWORD, "name": name }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        (
            response.body["token"].as_str().unwrap().to_string(),
            response.body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    pub async fn record_session(&self, token: &str, correct: i64, total: i64) -> TestResponse {
        self.post(
            "/api/progress/sessions",
            Some(token),
            json!({
                "exercise_type": "intervals",
                "score": if total > 0 { correct * 100 / total } else { 0 },
                "correct": correct,
                "total": total,
                "duration_secs": 90
            }),
        )
        .await
    }
}

/// Mails delivered so far, once there are at least `count`
///
/// Reset mails go out from a background task, so tests poll for them.
pub async fn wait_for_mail(mailer: &LogMailer, count: usize) -> Vec<OutgoingMail> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let sent = mailer.sent();
        if sent.len() >= count {
            return sent;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "expected {} mails, got {}",
            count,
            sent.len()
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
