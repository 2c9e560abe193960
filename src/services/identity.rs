//! Acting identity resolution and mutation rights
//!
//! Every service operation that needs to know who is calling receives a
//! [`RequestContext`] and resolves it here, once per operation.

use serde::Serialize;
use std::sync::Arc;

use crate::db::repositories::{RoleRepository, UserRepository};
use crate::models::{Role, User};
use crate::services::messages;
use crate::services::token::TokenService;

/// Per-request caller information
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Raw bearer token, without the `Bearer ` prefix
    pub token: Option<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Build from an `Authorization` header value. Anything other than a
    /// non-empty `Bearer` credential yields an anonymous context.
    pub fn from_authorization(header: Option<&str>) -> Self {
        let token = header
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string);
        Self { token }
    }
}

/// A user together with its loaded role
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub user: User,
    pub role: Role,
}

impl Identity {
    pub fn username(&self) -> &str {
        &self.user.username
    }

    /// Name recorded in audit fields
    pub fn display_name(&self) -> &str {
        &self.user.full_name
    }
}

/// Whether `acting` may mutate `target`: self-edit, or a strictly higher role.
pub fn authorize_mutation(acting: &Identity, target: &Identity) -> bool {
    acting.username() == target.username() || acting.role.outranks(target.role)
}

/// Error types for identity resolution
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Token missing or rejected
    #[error("{0}")]
    Unauthenticated(String),

    /// Token subject has no account
    #[error("{0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Resolves request contexts into identities
pub struct IdentityResolver {
    user_repo: Arc<dyn UserRepository>,
    role_repo: Arc<dyn RoleRepository>,
    tokens: Arc<dyn TokenService>,
}

impl IdentityResolver {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        role_repo: Arc<dyn RoleRepository>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            user_repo,
            role_repo,
            tokens,
        }
    }

    /// Resolve the caller, failing when there is no usable token or no such user.
    pub async fn resolve_acting_identity(
        &self,
        ctx: &RequestContext,
    ) -> Result<Identity, IdentityError> {
        let token = ctx
            .token
            .as_deref()
            .ok_or_else(|| IdentityError::Unauthenticated(messages::TOKEN_MISSING.to_string()))?;

        let username = self
            .tokens
            .subject(token)
            .ok_or_else(|| IdentityError::Unauthenticated(messages::TOKEN_INVALID.to_string()))?;

        let user = self
            .user_repo
            .get_by_username(&username)
            .await?
            .ok_or_else(|| IdentityError::NotFound(messages::user_not_found_by_username(&username)))?;

        Ok(self.identity_of(user).await?)
    }

    /// Resolve the caller if possible. No token, a rejected token or an
    /// unknown subject all mean an anonymous caller.
    pub async fn try_resolve(&self, ctx: &RequestContext) -> Result<Option<Identity>, IdentityError> {
        match self.resolve_acting_identity(ctx).await {
            Ok(identity) => Ok(Some(identity)),
            Err(IdentityError::Unauthenticated(_)) | Err(IdentityError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Load the role of `user`
    pub async fn identity_of(&self, user: User) -> anyhow::Result<Identity> {
        let record = self
            .role_repo
            .get_by_id(user.role_id)
            .await?
            .ok_or_else(|| {
                anyhow::anyhow!("User {} references missing role {}", user.username, user.role_id)
            })?;

        Ok(Identity {
            user,
            role: record.role,
        })
    }
}
