//! Password reset flow
//!
//! request → emailed single-use token → verify (optional) → apply.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use eartrain_common::auth::{generate_reset_token, hash_reset_token};
use eartrain_common::time;
use eartrain_common::validation::{normalize_email, validate_password};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::auth::hash_password_blocking;
use super::extract::{ApiJson, ApiQuery};
use crate::db::{password_resets, users};
use crate::error::{ApiError, ApiResult};
use crate::mailer::password_reset_mail;
use crate::AppState;

const INVALID_TOKEN: &str = "Invalid or expired reset token";
const REQUEST_ACCEPTED: &str =
    "If an account exists for that email, a password reset link has been sent";

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub email: String,
}

fn invalid_token() -> ApiError {
    ApiError::BadRequest(INVALID_TOKEN.to_string())
}

/// POST /api/auth/password-reset/request
///
/// Always answers 200 with the same message so callers cannot tell which
/// emails have accounts. Token storage and delivery run in a background
/// task, so a known email answers as fast as an unknown one.
pub async fn request_reset(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResetRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let email = normalize_email(&req.email);

    if let Some(user) = users::find_by_email(&state.db, &email).await? {
        tokio::spawn(send_reset_link(state, user.id, user.email));
    }

    Ok(Json(MessageResponse {
        message: REQUEST_ACCEPTED.to_string(),
    }))
}

/// Store a fresh reset token for `email` and mail the link
///
/// Runs detached from the request; failures are only logged.
async fn send_reset_link(state: AppState, user_id: String, email: String) {
    let now = time::now();
    let token = generate_reset_token();
    let ttl = state.config.reset_token_ttl_minutes;

    let stored = password_resets::create_reset(
        &state.db,
        &email,
        &token.hash,
        time::minutes_after(now, ttl),
        now,
    )
    .await;
    if let Err(e) = stored {
        error!("Failed to store password reset for user {}: {}", user_id, e);
        return;
    }

    let mail = password_reset_mail(&email, &state.config.frontend_url, &token.raw, ttl);
    match state.mailer.send(mail).await {
        Ok(()) => info!("Password reset requested for user {}", user_id),
        Err(e) => error!("Failed to send password reset mail to user {}: {}", user_id, e),
    }
}

/// GET /api/auth/password-reset/verify?token=
pub async fn verify_reset(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<VerifyQuery>,
) -> ApiResult<Json<VerifyResponse>> {
    let token = query
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(invalid_token)?;

    let reset = password_resets::find_usable(&state.db, &hash_reset_token(&token), time::now())
        .await?
        .ok_or_else(invalid_token)?;

    Ok(Json(VerifyResponse {
        valid: true,
        email: reset.email,
    }))
}

/// POST /api/auth/password-reset/apply
pub async fn apply_reset(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ApplyRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if req.token.trim().is_empty() {
        return Err(invalid_token());
    }
    validate_password(&req.password)?;

    let token_hash = hash_reset_token(&req.token);
    let password_hash = hash_password_blocking(req.password).await?;
    let now = time::now();

    let mut tx = state.db.begin().await?;
    let email = password_resets::consume(&mut tx, &token_hash, now)
        .await?
        .ok_or_else(invalid_token)?;

    if !users::set_password_by_email(&mut tx, &email, &password_hash, now).await? {
        return Err(invalid_token());
    }
    password_resets::invalidate_for_email(&mut tx, &email).await?;
    tx.commit().await?;

    info!("Password reset applied");
    Ok(Json(MessageResponse {
        message: "Password has been reset".to_string(),
    }))
}

pub fn password_reset_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/password-reset/request", post(request_reset))
        .route("/api/auth/password-reset/verify", get(verify_reset))
        .route("/api/auth/password-reset/apply", post(apply_reset))
}
