//! Leaderboard endpoint

use axum::{extract::State, routing::get, Json, Router};
use eartrain_common::models::LeaderboardMetric;
use eartrain_common::time;
use eartrain_common::validation::in_range;
use serde::{Deserialize, Serialize};

use super::extract::ApiQuery;
use crate::db::leaderboard::{self, LeaderboardEntry};
use crate::error::ApiResult;
use crate::AppState;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default)]
    pub metric: LeaderboardMetric,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RankedEntry {
    #[serde(flatten)]
    pub entry: LeaderboardEntry,
    /// The ranked metric's value
    pub value: f64,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub metric: LeaderboardMetric,
    pub entries: Vec<RankedEntry>,
}

/// GET /api/leaderboard?metric=&limit=
pub async fn get_leaderboard(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LeaderboardQuery>,
) -> ApiResult<Json<LeaderboardResponse>> {
    let limit = in_range("limit", query.limit.unwrap_or(DEFAULT_LIMIT), 1, MAX_LIMIT)?;
    let metric = query.metric;

    let entries = leaderboard::top(&state.db, metric, limit, time::now())
        .await?
        .into_iter()
        .map(|entry| RankedEntry {
            value: entry.value(metric),
            entry,
        })
        .collect();

    Ok(Json(LeaderboardResponse { metric, entries }))
}

pub fn leaderboard_routes() -> Router<AppState> {
    Router::new().route("/api/leaderboard", get(get_leaderboard))
}
