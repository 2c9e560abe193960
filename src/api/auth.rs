//! Authentication API endpoints
//!
//! Handles HTTP requests for user authentication:
//! - POST /api/v1/auth/register - Self registration as USER
//! - POST /api/v1/auth/login - Exchange credentials for a bearer token
//! - GET /api/v1/auth/me - Get current user

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{CreateUserInput, User};
use crate::services::{Identity, RequestContext};

/// Request body for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response for successful login
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Public auth routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Auth routes behind `require_auth`
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

/// POST /api/v1/auth/register
///
/// Registration never carries a creator, so the account is always a USER.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<CreateUserInput>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state
        .user_service
        .create(
            CreateUserInput { role: None, ..input },
            &RequestContext::anonymous(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state
        .user_service
        .login(&request.username, &request.password)
        .await?;
    Ok(Json(TokenResponse { token }))
}

/// GET /api/v1/auth/me
async fn me(Extension(user): Extension<AuthenticatedUser>) -> Json<Identity> {
    Json(user.0)
}
