//! eartrain-server library - HTTP API for the EarTrain ear-training app
//!
//! Accounts (password and Google sign-in), password reset, progress tracking
//! with XP/levels/streaks/badges, leaderboards and the chord-progression
//! catalog with MIDI voicings.

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use eartrain_common::auth::TokenService;
use eartrain_common::config::ServerConfig;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub mod api;
pub mod db;
pub mod error;
pub mod mailer;
pub mod oauth;
pub mod pagination;
pub mod purge;

use mailer::{LogMailer, Mailer};
use oauth::IdentityProvider;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub tokens: Arc<TokenService>,
    pub config: Arc<ServerConfig>,
    pub mailer: Arc<dyn Mailer>,
    /// `None` when Google sign-in is not configured
    pub identity: Option<Arc<dyn IdentityProvider>>,
}

impl AppState {
    /// State that logs mail and has Google sign-in disabled
    pub fn new(db: SqlitePool, tokens: TokenService, config: ServerConfig) -> Self {
        Self {
            db,
            tokens: Arc::new(tokens),
            config: Arc::new(config),
            mailer: Arc::new(LogMailer::new()),
            identity: None,
        }
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(provider);
        self
    }
}

/// CORS for the configured frontend origin
fn cors_layer(frontend_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match HeaderValue::from_str(frontend_url) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            warn!("Frontend URL is not a valid origin, CORS disabled: {}", e);
            layer
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.frontend_url);

    Router::new()
        .merge(api::health_routes())
        .merge(api::buildinfo_routes())
        .merge(api::auth_routes())
        .merge(api::oauth_routes())
        .merge(api::password_reset_routes())
        .merge(api::user_routes())
        .merge(api::progress_routes())
        .merge(api::leaderboard_routes())
        .merge(api::chord_progression_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
