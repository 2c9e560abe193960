//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error envelope and service error mapping
//! - `RequestContext` extraction from the `Authorization` header
//! - Authentication and ADMIN-or-above authorization middleware

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

use crate::config::{Config, PaginationConfig};
use crate::db::repositories::{
    SqlxCategoryRepository, SqlxNewsRepository, SqlxRoleRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::services::{
    messages, CategoryService, CategoryServiceError, Identity, IdentityError, IdentityResolver,
    JwtTokenService, NewsService, NewsServiceError, RequestContext, UserService,
    UserServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pagination: Arc<PaginationConfig>,
    pub identity: Arc<IdentityResolver>,
    pub user_service: Arc<UserService>,
    pub category_service: Arc<CategoryService>,
    pub news_service: Arc<NewsService>,
}

impl AppState {
    /// Wire repositories and services over a migrated pool
    pub fn new(pool: DynDatabasePool, config: &Config) -> Self {
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let role_repo = SqlxRoleRepository::boxed(pool.clone());
        let category_repo = SqlxCategoryRepository::boxed(pool.clone());
        let news_repo = SqlxNewsRepository::boxed(pool);

        let tokens = Arc::new(JwtTokenService::from_config(&config.auth));
        let identity = Arc::new(IdentityResolver::new(
            user_repo.clone(),
            role_repo,
            tokens.clone(),
        ));

        Self {
            pagination: Arc::new(config.pagination.clone()),
            user_service: Arc::new(UserService::new(user_repo, identity.clone(), tokens)),
            category_service: Arc::new(CategoryService::new(
                category_repo.clone(),
                identity.clone(),
            )),
            news_service: Arc::new(NewsService::new(news_repo, category_repo, identity.clone())),
            identity,
        }
    }
}

/// Authenticated caller, inserted by [`require_auth`]
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    /// Log the cause and hide it from the client
    fn internal(err: anyhow::Error) -> Self {
        tracing::error!("Internal error: {:#}", err);
        Self::internal_error("Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            // A token naming a vanished account is as good as no token
            IdentityError::Unauthenticated(msg) | IdentityError::NotFound(msg) => {
                Self::unauthorized(msg)
            }
            IdentityError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::NotFound(msg) => Self::not_found(msg),
            UserServiceError::DuplicateUsername(msg) => Self::conflict(msg),
            UserServiceError::AuthorizationError(msg) => Self::forbidden(msg),
            UserServiceError::Unauthenticated(msg) | UserServiceError::LoginFailed(msg) => {
                Self::unauthorized(msg)
            }
            UserServiceError::ValidationError(msg) => Self::validation_error(msg),
            UserServiceError::RegisterFailed(msg) => Self::internal_error(msg),
            UserServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<CategoryServiceError> for ApiError {
    fn from(err: CategoryServiceError) -> Self {
        match err {
            CategoryServiceError::NotFound(msg) => Self::not_found(msg),
            CategoryServiceError::DuplicateName(msg) => Self::conflict(msg),
            CategoryServiceError::Unauthenticated(msg) => Self::unauthorized(msg),
            CategoryServiceError::ValidationError(msg) => Self::validation_error(msg),
            CategoryServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<NewsServiceError> for ApiError {
    fn from(err: NewsServiceError) -> Self {
        match err {
            NewsServiceError::NotFound(msg) => Self::not_found(msg),
            NewsServiceError::Unauthenticated(msg) => Self::unauthorized(msg),
            NewsServiceError::ValidationError(msg) => Self::validation_error(msg),
            NewsServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

fn context_from_parts(parts: &Parts) -> RequestContext {
    let header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    RequestContext::from_authorization(header)
}

/// Every request has a context; a missing or malformed header is anonymous.
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(context_from_parts(parts))
    }
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();
    let ctx = context_from_parts(&parts);

    let identity = state.identity.resolve_acting_identity(&ctx).await?;

    parts.extensions.insert(AuthenticatedUser(identity));
    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// ADMIN-or-above authorization middleware; runs after [`require_auth`]
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized(messages::TOKEN_MISSING))?;

    if !user.0.role.is_elevated() {
        tracing::debug!("{} ({}) refused admin route", user.0.username(), user.0.role);
        return Err(ApiError::forbidden(messages::AUTHORIZED));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_envelope_and_status() {
        let response = ApiError::conflict("This name : Sport is exits").into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "CONFLICT");
        assert_eq!(json["error"]["message"], "This name : Sport is exits");
    }

    #[test]
    fn test_service_error_mapping() {
        let cases: Vec<(ApiError, &str)> = vec![
            (UserServiceError::AuthorizationError("x".into()).into(), "FORBIDDEN"),
            (UserServiceError::DuplicateUsername("x".into()).into(), "CONFLICT"),
            (UserServiceError::LoginFailed("x".into()).into(), "UNAUTHORIZED"),
            (UserServiceError::ValidationError("x".into()).into(), "VALIDATION_ERROR"),
            (UserServiceError::RegisterFailed("x".into()).into(), "INTERNAL_ERROR"),
            (CategoryServiceError::NotFound("x".into()).into(), "NOT_FOUND"),
            (NewsServiceError::Unauthenticated("x".into()).into(), "UNAUTHORIZED"),
            (IdentityError::NotFound("x".into()).into(), "UNAUTHORIZED"),
        ];

        for (error, code) in cases {
            assert_eq!(error.error.code, code);
        }
    }

    #[test]
    fn test_internal_error_hides_cause() {
        let error: ApiError = NewsServiceError::InternalError(anyhow::anyhow!("db password leaked")).into();
        assert!(!error.error.message.contains("password"));
    }

    #[tokio::test]
    async fn test_request_context_extraction() {
        let (mut parts, _) = axum::http::Request::builder()
            .header(header::AUTHORIZATION, "Bearer abc.def")
            .body(())
            .unwrap()
            .into_parts();

        let ctx = RequestContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ctx.token.as_deref(), Some("abc.def"));

        let (mut parts, _) = axum::http::Request::builder().body(()).unwrap().into_parts();
        let ctx = RequestContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(ctx.token.is_none());
    }
}
