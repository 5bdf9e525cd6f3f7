//! Build information endpoint

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Build identification captured by `build.rs`
#[derive(Debug, Serialize)]
pub struct BuildInfo {
    pub version: String,
    pub git_hash: String,
    pub build_timestamp: String,
    pub build_profile: String,
}

/// GET /build_info
pub async fn get_build_info() -> Json<BuildInfo> {
    Json(BuildInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
        build_profile: env!("BUILD_PROFILE").to_string(),
    })
}

pub fn buildinfo_routes() -> Router<AppState> {
    Router::new().route("/build_info", get(get_build_info))
}
