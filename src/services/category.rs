//! Category service
//!
//! Implements business logic for category management:
//! - Create, read, update, delete categories
//! - Name uniqueness, checked up front and backed by the UNIQUE constraint
//! - Audit names taken from the acting identity
//! - Paged listing, newest first

use std::sync::Arc;

use crate::db::is_unique_violation;
use crate::db::repositories::CategoryRepository;
use crate::models::{Category, CreateCategoryInput, PageRequest, PageResult, UpdateCategoryInput};
use crate::services::identity::{IdentityError, IdentityResolver, RequestContext};
use crate::services::messages;

/// Width of the `category_name` column
pub const MAX_NAME_LEN: usize = 100;

/// Error types for category service operations
#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    /// Category name already exists
    #[error("{0}")]
    DuplicateName(String),

    /// Category not found
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthenticated(String),

    /// Validation error
    #[error("{0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<IdentityError> for CategoryServiceError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Unauthenticated(msg) => Self::Unauthenticated(msg),
            IdentityError::NotFound(msg) => Self::NotFound(msg),
            IdentityError::InternalError(e) => Self::InternalError(e),
        }
    }
}

/// Category service
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
    identity: Arc<IdentityResolver>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>, identity: Arc<IdentityResolver>) -> Self {
        Self { repo, identity }
    }

    /// Create a category recorded as created by the caller
    pub async fn create(
        &self,
        input: CreateCategoryInput,
        ctx: &RequestContext,
    ) -> Result<Category, CategoryServiceError> {
        let name = validate_name(&input.name)?;

        if self.repo.exists_by_name(&name).await? {
            return Err(CategoryServiceError::DuplicateName(messages::name_exists(&name)));
        }

        let acting = self.identity.resolve_acting_identity(ctx).await?;

        let mut category = Category::new(name, input.description);
        category.created_by = Some(acting.display_name().to_string());

        let created = self
            .repo
            .create(&category)
            .await
            .map_err(|e| duplicate_or_internal(e, &category.name))?;

        tracing::info!("Category {} created by {}", created.name, acting.username());
        Ok(created)
    }

    /// Overwrite a category's name and description
    pub async fn update(
        &self,
        id: i64,
        input: UpdateCategoryInput,
        ctx: &RequestContext,
    ) -> Result<Category, CategoryServiceError> {
        let mut category = self.get_by_id(id).await?;
        let acting = self.identity.resolve_acting_identity(ctx).await?;
        let name = validate_name(&input.name)?;

        if let Some(existing) = self.repo.get_by_name(&name).await? {
            if existing.id != category.id {
                return Err(CategoryServiceError::DuplicateName(messages::name_exists(&name)));
            }
        }

        category.name = name;
        category.description = input.description;
        category.last_modified_by = Some(acting.display_name().to_string());

        self.repo
            .update(&category)
            .await
            .map_err(|e| duplicate_or_internal(e, &category.name))
    }

    /// Delete a category together with its news
    pub async fn delete(&self, id: i64) -> Result<&'static str, CategoryServiceError> {
        if !self.repo.exists_by_id(id).await? {
            return Err(CategoryServiceError::NotFound(messages::not_found("category", id)));
        }

        self.repo.delete(id).await?;
        tracing::info!("Category {} deleted", id);
        Ok(messages::DELETE_SUCCESS)
    }

    /// Get a category by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Category, CategoryServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| CategoryServiceError::NotFound(messages::not_found("category", id)))
    }

    /// Every category, by name
    pub async fn list_all(&self) -> Result<Vec<Category>, CategoryServiceError> {
        Ok(self.repo.list().await?)
    }

    /// One page of categories, newest first
    pub async fn search_page_category(
        &self,
        page: u32,
        size: u32,
    ) -> Result<PageResult<Category>, CategoryServiceError> {
        let request = PageRequest::newest_first(page, size);
        let (categories, total) = self.repo.list_page(&request).await?;
        Ok(PageResult::new(categories, total, &request))
    }
}

fn validate_name(name: &str) -> Result<String, CategoryServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CategoryServiceError::ValidationError(
            "Category name cannot be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CategoryServiceError::ValidationError(format!(
            "Category name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

fn duplicate_or_internal(err: anyhow::Error, name: &str) -> CategoryServiceError {
    if is_unique_violation(&err) {
        CategoryServiceError::DuplicateName(messages::name_exists(name))
    } else {
        CategoryServiceError::InternalError(err)
    }
}
