//! Integration tests for Google sign-in, using a stand-in identity provider

mod common;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{setup, setup_with, TestApp, TestResponse};
use eartrain_server::db::users;
use eartrain_server::oauth::{ExternalIdentity, IdentityProvider, OAuthError};
use std::sync::Arc;

struct FakeProvider {
    identity: ExternalIdentity,
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn authorize_url(&self, state: &str) -> Result<String, OAuthError> {
        Ok(format!("https://idp.test/authorize?state={}", state))
    }

    async fn exchange_code(&self, code: &str) -> Result<ExternalIdentity, OAuthError> {
        if code == "good-code" {
            Ok(self.identity.clone())
        } else {
            Err(OAuthError::Rejected("bad code".to_string()))
        }
    }
}

fn identity() -> ExternalIdentity {
    ExternalIdentity {
        subject: "google-sub-42".to_string(),
        email: "Grace@Example.com".to_string(),
        name: Some("Grace Hopper".to_string()),
        avatar: Some("https://img.test/grace.png".to_string()),
    }
}

async fn setup_google() -> TestApp {
    setup_with(|state| {
        state.with_identity_provider(Arc::new(FakeProvider {
            identity: identity(),
        }))
    })
    .await
}

fn location(response: &TestResponse) -> String {
    response.headers[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}

/// Start the flow and return the state value from the cookie
async fn start(app: &TestApp) -> String {
    let response = app.get("/api/auth/google", None).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let cookie = response.headers[header::SET_COOKIE].to_str().unwrap();
    let value = cookie
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix("eartrain_oauth_state="))
        .expect("state cookie set")
        .to_string();

    assert!(location(&response).ends_with(&format!("state={}", value)));
    value
}

async fn callback(app: &TestApp, cookie_state: &str, query: &str) -> TestResponse {
    app.send(
        Request::builder()
            .uri(format!("/api/auth/google/callback?{}", query))
            .header(header::COOKIE, format!("eartrain_oauth_state={}", cookie_state))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

fn token_from_redirect(url: &str) -> String {
    url.split_once("token=")
        .map(|(_, token)| token.to_string())
        .expect("redirect carries a token")
}

#[tokio::test]
async fn test_google_unconfigured_is_unavailable() {
    let app = setup().await;

    let response = app.get("/api/auth/google", None).await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["error"]["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_callback_creates_user_and_redirects_with_token() {
    let app = setup_google().await;
    let state = start(&app).await;

    let response = callback(&app, &state, &format!("code=good-code&state={}", state)).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let url = location(&response);
    assert!(url.starts_with("http://localhost:3000/auth/callback?token="));
    let token = token_from_redirect(&url);

    let me = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["user"]["email"], "grace@example.com");
    assert_eq!(me.body["user"]["name"], "Grace Hopper");
    assert_eq!(me.body["user"]["google_linked"], true);
    assert_eq!(me.body["user"]["has_password"], false);

    // signing in again finds the same account
    let state = start(&app).await;
    let again = callback(&app, &state, &format!("code=good-code&state={}", state)).await;
    let token = token_from_redirect(&location(&again));
    let me_again = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(me_again.body["user"]["id"], me.body["user"]["id"]);
    assert_eq!(users::count_users(&app.state.db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_callback_links_existing_password_account() {
    let app = setup_google().await;
    let (_, user_id) = app.register("grace@example.com", "Grace").await;

    let state = start(&app).await;
    let response = callback(&app, &state, &format!("code=good-code&state={}", state)).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let user = users::find_by_id(&app.state.db, &user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.google_id.as_deref(), Some("google-sub-42"));
    assert!(user.password_hash.is_some());
    assert_eq!(user.name, "Grace");
    assert_eq!(users::count_users(&app.state.db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_callback_rejects_state_mismatch() {
    let app = setup_google().await;
    let state = start(&app).await;

    let response = callback(&app, &state, "code=good-code&state=forged").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"]["message"], "OAuth state mismatch");

    let no_code = callback(&app, &state, &format!("state={}", state)).await;
    assert_eq!(no_code.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_provider_errors() {
    let app = setup_google().await;
    let state = start(&app).await;

    let denied = callback(&app, &state, "error=access_denied").await;
    assert_eq!(denied.status, StatusCode::SEE_OTHER);
    assert_eq!(
        location(&denied),
        "http://localhost:3000/auth/callback?error=oauth_denied"
    );

    let rejected = callback(&app, &state, &format!("code=bad-code&state={}", state)).await;
    assert_eq!(rejected.status, StatusCode::BAD_GATEWAY);
    assert_eq!(rejected.body["error"]["code"], "UPSTREAM_ERROR");
}
