//! User service
//!
//! Implements business logic for accounts:
//! - Anonymous self-registration and elevated creation by admins
//! - Profile updates guarded by the self-or-higher-role rule
//! - Login with argon2 verification and token issuance
//! - Paged listing

use std::sync::Arc;

use crate::config::BootstrapAdmin;
use crate::db::is_unique_violation;
use crate::db::repositories::UserRepository;
use crate::models::{
    parse_birthday, CreateUserInput, PageRequest, PageResult, Role, UpdateUserInput, User,
};
use crate::services::identity::{
    authorize_mutation, Identity, IdentityError, IdentityResolver, RequestContext,
};
use crate::services::messages;
use crate::services::password::{hash_password, verify_password};
use crate::services::token::TokenService;

/// Width of the `username` column
const MAX_USERNAME_LEN: usize = 50;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    DuplicateUsername(String),

    /// Acting identity may not perform the mutation
    #[error("{0}")]
    AuthorizationError(String),

    #[error("{0}")]
    Unauthenticated(String),

    /// Validation error (invalid input)
    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    LoginFailed(String),

    /// Storage failure while saving a new account
    #[error("{0}")]
    RegisterFailed(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<IdentityError> for UserServiceError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Unauthenticated(msg) => Self::Unauthenticated(msg),
            IdentityError::NotFound(msg) => Self::NotFound(msg),
            IdentityError::InternalError(e) => Self::InternalError(e),
        }
    }
}

/// User service for accounts and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    identity: Arc<IdentityResolver>,
    tokens: Arc<dyn TokenService>,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        identity: Arc<IdentityResolver>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            user_repo,
            identity,
            tokens,
        }
    }

    /// Create an account.
    ///
    /// An ADMIN or SUPER_ADMIN caller creates an account with the requested
    /// role (ADMIN when none is given), never above its own. Any other caller,
    /// including one with no or an unusable token, self-registers as USER and
    /// is recorded as its own creator.
    ///
    /// # Errors
    ///
    /// - `DuplicateUsername` if the username is taken
    /// - `ValidationError` for blank required fields or a malformed birthday
    /// - `AuthorizationError` if the requested role outranks the creator
    /// - `RegisterFailed` if saving fails
    pub async fn create(
        &self,
        input: CreateUserInput,
        ctx: &RequestContext,
    ) -> Result<User, UserServiceError> {
        let username = input.username.trim().to_string();
        if username.is_empty() || input.password.is_empty() || input.full_name.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username, password and full name are required".to_string(),
            ));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(UserServiceError::ValidationError(format!(
                "Username must be at most {} characters",
                MAX_USERNAME_LEN
            )));
        }

        if self.user_repo.exists_by_username(&username).await? {
            return Err(UserServiceError::DuplicateUsername(messages::username_exists(
                &username,
            )));
        }

        let birthday = parse_optional_birthday(input.birthday.as_deref())?;

        let creator = self
            .identity
            .try_resolve(ctx)
            .await?
            .filter(|identity| identity.role.is_elevated());

        let (role, created_by) = match &creator {
            Some(creator) => {
                let role = input.role.unwrap_or(Role::Admin);
                if role.outranks(creator.role) {
                    return Err(UserServiceError::AuthorizationError(
                        messages::AUTHORIZED.to_string(),
                    ));
                }
                (role, creator.display_name().to_string())
            }
            None => (Role::User, input.full_name.clone()),
        };

        let password_hash = hash_password(&input.password)?;
        let mut user = User::new(username, password_hash, input.full_name, role);
        user.email = input.email;
        user.phone = input.phone;
        user.address = input.address;
        user.gender = input.gender;
        user.avatar = input.avatar;
        user.birthday = birthday;
        user.created_by = Some(created_by);

        let created = self.user_repo.create(&user).await.map_err(|e| {
            if is_unique_violation(&e) {
                UserServiceError::DuplicateUsername(messages::username_exists(&user.username))
            } else {
                tracing::warn!("Failed to save user {}: {:#}", user.username, e);
                UserServiceError::RegisterFailed(messages::register_failed(format!("{:#}", e)))
            }
        })?;

        tracing::info!(
            "Created user {} with role {} (by {})",
            created.username,
            role,
            created.created_by.as_deref().unwrap_or_default()
        );
        Ok(created)
    }

    /// Overwrite a user's profile fields.
    ///
    /// The caller must be the target itself or hold a strictly higher role.
    pub async fn update(
        &self,
        id: i64,
        input: UpdateUserInput,
        ctx: &RequestContext,
    ) -> Result<User, UserServiceError> {
        let target = self
            .user_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| UserServiceError::NotFound(messages::not_found("user", id)))?;

        let acting = self.identity.resolve_acting_identity(ctx).await?;
        let target = self.identity.identity_of(target).await?;

        if !authorize_mutation(&acting, &target) {
            tracing::debug!(
                "{} ({}) denied update of {} ({})",
                acting.username(),
                acting.role,
                target.username(),
                target.role
            );
            return Err(UserServiceError::AuthorizationError(
                messages::AUTHORIZED.to_string(),
            ));
        }

        if input.full_name.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Full name cannot be empty".to_string(),
            ));
        }
        let birthday = parse_optional_birthday(input.birthday.as_deref())?;

        let mut user = target.user;
        user.full_name = input.full_name;
        user.email = input.email;
        user.phone = input.phone;
        user.address = input.address;
        user.gender = input.gender;
        user.avatar = input.avatar;
        user.birthday = birthday;
        user.last_modified_by = Some(acting.display_name().to_string());

        Ok(self.user_repo.update(&user).await?)
    }

    /// Get a user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<User, UserServiceError> {
        self.user_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| UserServiceError::NotFound(messages::not_found("user", id)))
    }

    /// One page of users, newest first
    pub async fn search_page(&self, page: u32, size: u32) -> Result<PageResult<User>, UserServiceError> {
        let request = PageRequest::newest_first(page, size);
        let (users, total) = self.user_repo.list_page(&request).await?;
        Ok(PageResult::new(users, total, &request))
    }

    /// Verify credentials and issue a bearer token
    pub async fn login(&self, username: &str, password: &str) -> Result<String, UserServiceError> {
        let login_failed = || UserServiceError::LoginFailed(messages::LOGIN_FAIL.to_string());

        let user = self
            .user_repo
            .get_by_username(username.trim())
            .await?
            .ok_or_else(login_failed)?;

        if !verify_password(password, &user.password_hash)? {
            tracing::debug!("Wrong password for {}", user.username);
            return Err(login_failed());
        }

        Ok(self.tokens.issue(&user.username)?)
    }

    /// The caller's own identity
    pub async fn current_user(&self, ctx: &RequestContext) -> Result<Identity, UserServiceError> {
        Ok(self.identity.resolve_acting_identity(ctx).await?)
    }

    /// Create the configured SUPER_ADMIN account if its username is free.
    ///
    /// Returns whether an account was created.
    pub async fn ensure_super_admin(&self, admin: &BootstrapAdmin) -> Result<bool, UserServiceError> {
        if self.user_repo.exists_by_username(&admin.username).await? {
            tracing::debug!("Bootstrap admin {} already exists", admin.username);
            return Ok(false);
        }

        let mut user = User::new(
            admin.username.clone(),
            hash_password(&admin.password)?,
            admin.full_name.clone(),
            Role::SuperAdmin,
        );
        user.created_by = Some(admin.full_name.clone());

        match self.user_repo.create(&user).await {
            Ok(_) => {
                tracing::info!("Created bootstrap super admin {}", admin.username);
                Ok(true)
            }
            // Another instance won the race
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn parse_optional_birthday(
    value: Option<&str>,
) -> Result<Option<chrono::NaiveDate>, UserServiceError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(text) => parse_birthday(text)
            .map(Some)
            .ok_or_else(|| UserServiceError::ValidationError(messages::INVALID_BIRTHDAY.to_string())),
    }
}
