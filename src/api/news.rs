//! News API endpoints
//!
//! - GET /api/v1/news/search?keyword= - Keyword search, newest first
//! - GET /api/v1/news/filter?category_id=&author=&title=&sort= - News of one category
//! - GET /api/v1/news/{id} - Read an article (counts a view)
//! - POST, PUT /{id}, DELETE /{id} - Admin only

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{MessageResponse, PageQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{News, NewsByCategory, NewsInput, PageResult};
use crate::services::RequestContext;

/// Query parameters for keyword search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub keyword: String,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

/// Query parameters for the category filter
#[derive(Debug, Deserialize)]
pub struct FilterQuery {
    pub category_id: i64,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// `ASC` or `DESC`; anything else sorts ascending
    #[serde(default)]
    pub sort: String,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

fn paging(page: Option<u32>, size: Option<u32>) -> PageQuery {
    PageQuery { page, size }
}

/// Public news routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/search", get(search_news))
        .route("/filter", get(filter_news))
        .route("/{id}", get(get_news))
}

/// News routes behind `require_admin`
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_news))
        .route("/{id}", put(update_news).delete(delete_news))
}

async fn search_news(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<PageResult<News>>, ApiError> {
    let (page, size) = paging(query.page, query.size).resolve(&state.pagination);
    Ok(Json(
        state.news_service.search(&query.keyword, page, size).await?,
    ))
}

async fn filter_news(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<NewsByCategory>, ApiError> {
    let (page, size) = paging(query.page, query.size).resolve(&state.pagination);
    let result = state
        .news_service
        .filter_news_by_category(
            page,
            size,
            query.author,
            query.title,
            query.category_id,
            &query.sort,
        )
        .await?;
    Ok(Json(result))
}

async fn get_news(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<News>, ApiError> {
    Ok(Json(state.news_service.get_by_id(id).await?))
}

async fn create_news(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(input): Json<NewsInput>,
) -> Result<(StatusCode, Json<News>), ApiError> {
    let news = state.news_service.create(input, &ctx).await?;
    Ok((StatusCode::CREATED, Json(news)))
}

async fn update_news(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ctx: RequestContext,
    Json(input): Json<NewsInput>,
) -> Result<Json<News>, ApiError> {
    Ok(Json(state.news_service.update(id, input, &ctx).await?))
}

async fn delete_news(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = state.news_service.delete(id).await?;
    Ok(Json(MessageResponse::new(message)))
}
