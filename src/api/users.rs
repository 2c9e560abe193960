//! User API endpoints
//!
//! - GET /api/v1/users - Paged user list, newest first
//! - GET /api/v1/users/{id} - Get user by ID
//! - POST /api/v1/users - Create a user; elevated callers may pick the role
//! - PUT /api/v1/users/{id} - Overwrite a profile (self or higher role)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::common::PageQuery;
use crate::api::middleware::{ApiError, AppState};
use crate::models::{CreateUserInput, PageResult, UpdateUserInput, User};
use crate::services::RequestContext;

/// Routes behind `require_auth`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).put(update_user))
}

async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResult<User>>, ApiError> {
    let (page, size) = query.resolve(&state.pagination);
    Ok(Json(state.user_service.search_page(page, size).await?))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.user_service.get_by_id(id).await?))
}

async fn create_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<CreateUserInput>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.user_service.create(input, &ctx).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ctx: RequestContext,
    Json(input): Json<UpdateUserInput>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.user_service.update(id, input, &ctx).await?))
}
