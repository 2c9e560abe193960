//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the newsdesk backend:
//! - Auth endpoints (register, login, current user)
//! - User endpoints
//! - Category endpoints
//! - News endpoints

pub mod auth;
pub mod categories;
pub mod common;
pub mod middleware;
pub mod news;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need ADMIN or above)
    let admin_routes = Router::new()
        .nest("/categories", categories::admin_router())
        .nest("/news", news::admin_router())
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but not admin)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/users", users::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/auth", auth::public_router())
        .nest("/categories", categories::router())
        .nest("/news", news::router())
        .merge(admin_routes)
        .merge(protected_routes)
}

fn allowed_origin(cors_origin: &str) -> AllowOrigin {
    if cors_origin.trim() == "*" {
        return AllowOrigin::any();
    }
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(e) => {
            tracing::warn!("Invalid CORS origin '{}': {}, allowing any", cors_origin, e);
            AllowOrigin::any()
        }
    }
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin(cors_origin))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
