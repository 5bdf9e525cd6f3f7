//! User listing

use axum::{extract::State, routing::get, Json, Router};
use eartrain_common::models::UserProfile;
use serde::Serialize;

use super::extract::{ApiQuery, AuthUser};
use crate::db::users;
use crate::error::ApiResult;
use crate::pagination::{PageQuery, Pagination};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserProfile>,
    pub pagination: Pagination,
}

/// GET /api/users?page=&per_page=
pub async fn list_users(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Json<UserListResponse>> {
    let total = users::count_users(&state.db).await?;
    let pagination = query.paginate(total);

    let users = users::list_users(&state.db, pagination.per_page, pagination.offset)
        .await?
        .iter()
        .map(|user| user.profile())
        .collect();

    Ok(Json(UserListResponse { users, pagination }))
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/api/users", get(list_users))
}
