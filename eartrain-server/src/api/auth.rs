//! Password registration, login and the current-user endpoint

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use eartrain_common::auth::{hash_password, verify_password_or_dummy};
use eartrain_common::gamification::LevelInfo;
use eartrain_common::models::{User, UserProfile};
use eartrain_common::time;
use eartrain_common::validation::{
    normalize_email, validate_email, validate_name, validate_password,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::extract::{ApiJson, AuthUser};
use crate::db::users::{self, NewUser};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token plus the signed-in user
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserProfile,
    pub level: LevelInfo,
}

/// Display name when none is given: the local part of the email
pub(crate) fn default_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

/// Argon2 is deliberately slow; keep it off the async workers
pub(crate) async fn hash_password_blocking(password: String) -> ApiResult<String> {
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("Hash task failed: {}", e)))??;
    Ok(hash)
}

async fn verify_password_blocking(password: String, hash: Option<String>) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || verify_password_or_dummy(&password, hash.as_deref()))
        .await
        .map_err(|e| ApiError::Internal(format!("Verify task failed: {}", e)))
}

pub(crate) fn auth_response(state: &AppState, user: &User) -> ApiResult<AuthResponse> {
    Ok(AuthResponse {
        token: state.tokens.issue(user)?,
        user: user.profile(),
    })
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let email = validate_email(&req.email)?;
    validate_password(&req.password)?;
    let name = match req.name.as_deref() {
        Some(name) if !name.trim().is_empty() => validate_name(name)?,
        _ => default_name(&email),
    };

    if users::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash_password_blocking(req.password).await?;
    let user = users::create_user(
        &state.db,
        NewUser {
            email,
            name,
            password_hash: Some(password_hash),
            google_id: None,
            avatar: None,
        },
        time::now(),
    )
    .await?;

    info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(auth_response(&state, &user)?)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let email = normalize_email(&req.email);
    let user = users::find_by_email(&state.db, &email).await?;

    // Unknown emails and Google-only accounts still pay for one verification
    let hash = user.as_ref().and_then(|u| u.password_hash.clone());
    let verified = verify_password_blocking(req.password, hash).await?;
    let user = match user {
        Some(user) if verified => user,
        Some(user) => {
            debug!("Failed login for user {}", user.id);
            return Err(invalid());
        }
        None => return Err(invalid()),
    };

    let now = time::now();
    users::touch_last_active(&state.db, &user.id, now).await?;
    let user = User {
        last_active: Some(now),
        ..user
    };

    Ok(Json(auth_response(&state, &user)?))
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<MeResponse>> {
    let user = users::find_by_id(&state.db, auth.user_id())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    Ok(Json(MeResponse {
        level: LevelInfo::from_xp(user.xp),
        user: user.profile(),
    }))
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_name_uses_local_part() {
        assert_eq!(default_name("ada.lovelace@example.com"), "ada.lovelace");
    }
}
