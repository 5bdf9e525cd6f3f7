//! Progress dashboard and session recording

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use eartrain_common::gamification::{find_badge, Badge, LevelInfo, SessionSubmission};
use eartrain_common::models::{ExerciseStat, ExerciseType, Progress, SessionRecord};
use eartrain_common::time;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::extract::{ApiJson, AuthUser};
use crate::db::{progress, users};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Badge as shown to clients
#[derive(Debug, Clone, Serialize)]
pub struct BadgeView {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl BadgeView {
    fn from_badge(badge: &Badge, unlocked_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: badge.id.to_string(),
            name: badge.name.to_string(),
            description: badge.description.to_string(),
            unlocked_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub progress: Progress,
    pub level: LevelInfo,
    pub exercise_stats: Vec<ExerciseStat>,
    pub recent_sessions: Vec<SessionRecord>,
    pub badges: Vec<BadgeView>,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub exercise_type: ExerciseType,
    pub score: i64,
    pub correct: i64,
    pub total: i64,
    #[serde(default)]
    pub duration_secs: i64,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub xp_earned: i64,
    pub points_earned: i64,
    pub total_xp: i64,
    pub level_before: i64,
    pub level_after: i64,
    pub leveled_up: bool,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub accuracy: f64,
    pub level: LevelInfo,
    pub new_badges: Vec<BadgeView>,
}

/// GET /api/progress
pub async fn get_progress(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ProgressResponse>> {
    let user_id = auth.user_id();
    let progress = progress::load_progress(&state.db, user_id, time::now()).await?;
    let exercise_stats = progress::exercise_stats(&state.db, user_id).await?;
    let recent_sessions = progress::recent_sessions(&state.db, user_id).await?;

    // rows for badges no longer in the catalog are skipped
    let badges = progress::user_badges(&state.db, user_id)
        .await?
        .into_iter()
        .filter_map(|owned| {
            find_badge(&owned.badge_id).map(|b| BadgeView::from_badge(b, Some(owned.unlocked_at)))
        })
        .collect();

    Ok(Json(ProgressResponse {
        level: LevelInfo::from_xp(progress.total_xp),
        progress,
        exercise_stats,
        recent_sessions,
        badges,
    }))
}

/// POST /api/progress/sessions
pub async fn record_session(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<SessionRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let submission = SessionSubmission::new(
        req.exercise_type,
        req.score,
        req.correct,
        req.total,
        req.duration_secs,
    )?;

    let user_id = auth.user_id();
    if users::find_by_id(&state.db, user_id).await?.is_none() {
        return Err(ApiError::Unauthorized("User no longer exists".to_string()));
    }

    let recorded = progress::record_session(&state.db, user_id, &submission, time::now()).await?;
    let outcome = recorded.outcome;

    if outcome.leveled_up {
        info!("User {} reached level {}", user_id, outcome.level_after);
    }

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id: recorded.session_id,
            xp_earned: outcome.xp_earned,
            points_earned: outcome.points_earned,
            total_xp: outcome.total_xp,
            level_before: outcome.level_before,
            level_after: outcome.level_after,
            leveled_up: outcome.leveled_up,
            current_streak: outcome.current_streak,
            longest_streak: outcome.longest_streak,
            accuracy: outcome.accuracy,
            level: LevelInfo::from_xp(outcome.total_xp),
            new_badges: recorded
                .new_badges
                .iter()
                .map(|badge| BadgeView::from_badge(badge, None))
                .collect(),
        }),
    ))
}

/// GET /api/badges
pub async fn list_badges() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "badges": eartrain_common::gamification::BADGES }))
}

pub fn progress_routes() -> Router<AppState> {
    Router::new()
        .route("/api/progress", get(get_progress))
        .route("/api/progress/sessions", post(record_session))
        .route("/api/badges", get(list_badges))
}
