//! Error types for eartrain-server
//!
//! Every handler returns [`ApiResult`]. Errors render as
//! `{"error": {"code": "...", "message": "..."}}` with a matching status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use eartrain_common::auth::TokenError;
use eartrain_common::validation::ValidationError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::oauth::OAuthError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// A field failed validation (400)
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Missing or rejected credentials (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Duplicate resource (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Optional integration not configured (503)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Upstream identity provider failed (502)
    #[error("Upstream error: {0}")]
    BadGateway(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// eartrain-common error
    #[error("Common error: {0}")]
    Common(#[from] eartrain_common::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Common(err.into())
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => {
                ApiError::Unauthorized("Session expired, please log in again".to_string())
            }
            TokenError::Invalid(_) => ApiError::Unauthorized("Invalid token".to_string()),
            TokenError::Signing(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<OAuthError> for ApiError {
    fn from(err: OAuthError) -> Self {
        ApiError::BadGateway(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut field = None;
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Validation(err) => {
                field = Some(err.field);
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.message)
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg)
            }
            ApiError::BadGateway(msg) => {
                error!("Upstream failure: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "Sign-in provider request failed".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                internal()
            }
            ApiError::Common(err) => match err {
                eartrain_common::Error::NotFound(msg) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", msg)
                }
                eartrain_common::Error::InvalidInput(msg) => {
                    (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
                }
                eartrain_common::Error::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
                eartrain_common::Error::Auth(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg)
                }
                ref db_err if db_err.is_unique_violation() => (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    "Resource already exists".to_string(),
                ),
                other => {
                    error!("Internal error: {}", other);
                    internal()
                }
            },
        };

        let mut error = json!({
            "code": error_code,
            "message": message,
        });
        if let Some(field) = field {
            error["field"] = json!(field);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "Internal server error".to_string(),
    )
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
