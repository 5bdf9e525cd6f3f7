//! Google sign-in endpoints
//!
//! `/api/auth/google` sets a short-lived state cookie and redirects to the
//! consent screen. The callback checks the state, exchanges the code, finds
//! or creates the user and redirects to the frontend with a session token.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use eartrain_common::models::User;
use eartrain_common::validation::normalize_email;
use eartrain_common::{time, Error};
use rand::RngCore;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::auth::default_name;
use super::extract::ApiQuery;
use crate::db::users::{self, NewUser};
use crate::error::{ApiError, ApiResult};
use crate::oauth::{ExternalIdentity, IdentityProvider};
use crate::AppState;

const STATE_COOKIE: &str = "eartrain_oauth_state";
const STATE_COOKIE_MAX_AGE_SECS: u32 = 600;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn provider(state: &AppState) -> ApiResult<Arc<dyn IdentityProvider>> {
    state.identity.clone().ok_or_else(|| {
        ApiError::ServiceUnavailable("Google sign-in is not configured".to_string())
    })
}

fn random_state() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn state_cookie(value: &str, max_age: u32) -> String {
    format!(
        "{}={}; Path=/api/auth/google; Max-Age={}; HttpOnly; SameSite=Lax",
        STATE_COOKIE, value, max_age
    )
}

/// Value of the state cookie, if the browser sent one
fn cookie_state(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == STATE_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// GET /api/auth/google
pub async fn google_start(State(state): State<AppState>) -> ApiResult<Response> {
    let provider = provider(&state)?;
    let oauth_state = random_state();
    let url = provider.authorize_url(&oauth_state)?;

    Ok((
        [(
            header::SET_COOKIE,
            state_cookie(&oauth_state, STATE_COOKIE_MAX_AGE_SECS),
        )],
        Redirect::to(&url),
    )
        .into_response())
}

/// GET /api/auth/google/callback
pub async fn google_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<CallbackQuery>,
) -> ApiResult<Response> {
    let provider = provider(&state)?;
    let clear_cookie = [(header::SET_COOKIE, state_cookie("", 0))];

    if let Some(error) = query.error {
        warn!("Google sign-in declined: {}", error);
        let url = format!("{}/auth/callback?error=oauth_denied", state.config.frontend_url);
        return Ok((clear_cookie, Redirect::to(&url)).into_response());
    }

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing authorization code".to_string()))?;

    match (cookie_state(&headers), query.state) {
        (Some(expected), Some(received)) if !expected.is_empty() && expected == received => {}
        _ => return Err(ApiError::BadRequest("OAuth state mismatch".to_string())),
    }

    let identity = provider.exchange_code(&code).await?;
    let user = find_or_create_user(&state, identity).await?;

    let token = state.tokens.issue(&user)?;
    let url = format!("{}/auth/callback?token={}", state.config.frontend_url, token);
    Ok((clear_cookie, Redirect::to(&url)).into_response())
}

/// Match by Google id, then by email (linking the account), else create
async fn find_or_create_user(state: &AppState, identity: ExternalIdentity) -> ApiResult<User> {
    let now = time::now();

    if let Some(user) = users::find_by_google_id(&state.db, &identity.subject).await? {
        users::touch_last_active(&state.db, &user.id, now).await?;
        return Ok(user);
    }

    let email = normalize_email(&identity.email);
    if let Some(user) = users::find_by_email(&state.db, &email).await? {
        users::link_google(
            &state.db,
            &user.id,
            &identity.subject,
            identity.avatar.as_deref(),
            now,
        )
        .await?;
        info!("Linked Google account to user {}", user.id);
        return users::find_by_id(&state.db, &user.id)
            .await?
            .ok_or_else(|| ApiError::Internal("Linked user disappeared".to_string()));
    }

    let name = identity
        .name
        .clone()
        .unwrap_or_else(|| default_name(&email));
    let created = users::create_user(
        &state.db,
        NewUser {
            email: email.clone(),
            name,
            password_hash: None,
            google_id: Some(identity.subject.clone()),
            avatar: identity.avatar.clone(),
        },
        now,
    )
    .await;

    match created {
        Ok(user) => {
            info!("Created user {} from Google sign-in", user.id);
            Ok(user)
        }
        // a concurrent callback created the account first
        Err(Error::Conflict(_)) => users::find_by_email(&state.db, &email)
            .await?
            .ok_or_else(|| ApiError::Conflict("Account already exists".to_string())),
        Err(e) => Err(e.into()),
    }
}

pub fn oauth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/google", get(google_start))
        .route("/api/auth/google/callback", get(google_callback))
}
