//! Category API endpoints
//!
//! Handles HTTP requests for category management:
//! - GET /api/v1/categories - Paged categories, newest first
//! - GET /api/v1/categories/all - Every category by name
//! - GET /api/v1/categories/{id} - Get category by ID
//! - POST, PUT /{id}, DELETE /{id} - Admin only

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};

use crate::api::common::{MessageResponse, PageQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{Category, CreateCategoryInput, PageResult, UpdateCategoryInput};
use crate::services::RequestContext;

/// Public category routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories))
        .route("/all", get(all_categories))
        .route("/{id}", get(get_category))
}

/// Category routes behind `require_admin`
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_category))
        .route("/{id}", put(update_category).delete(delete_category))
}

async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResult<Category>>, ApiError> {
    let (page, size) = query.resolve(&state.pagination);
    Ok(Json(
        state.category_service.search_page_category(page, size).await?,
    ))
}

async fn all_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.category_service.list_all().await?))
}

async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Category>, ApiError> {
    Ok(Json(state.category_service.get_by_id(id).await?))
}

async fn create_category(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<CreateCategoryInput>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let category = state.category_service.create(input, &ctx).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ctx: RequestContext,
    Json(input): Json<UpdateCategoryInput>,
) -> Result<Json<Category>, ApiError> {
    Ok(Json(state.category_service.update(id, input, &ctx).await?))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = state.category_service.delete(id).await?;
    Ok(Json(MessageResponse::new(message)))
}
