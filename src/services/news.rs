//! News service
//!
//! Implements business logic for articles:
//! - Create, update and delete, always under an existing category
//! - Reading an article counts a view
//! - Category listing with optional title/author filters and sort direction
//! - Keyword search over titles and descriptions

use std::sync::Arc;

use crate::db::repositories::{CategoryRepository, NewsRepository};
use crate::models::{
    News, NewsByCategory, NewsFilter, NewsInput, PageRequest, PageResult, SortDirection,
};
use crate::services::identity::{IdentityError, IdentityResolver, RequestContext};
use crate::services::messages;

/// Widths of the bounded `news` columns
const MAX_TITLE_LEN: usize = 255;
const MAX_AUTHOR_LEN: usize = 255;
const MAX_THUMBNAIL_LEN: usize = 500;

/// Error types for news service operations
#[derive(Debug, thiserror::Error)]
pub enum NewsServiceError {
    /// Article or category not found
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

impl From<IdentityError> for NewsServiceError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Unauthenticated(msg) => Self::Unauthenticated(msg),
            IdentityError::NotFound(msg) => Self::NotFound(msg),
            IdentityError::InternalError(e) => Self::InternalError(e),
        }
    }
}

/// News service
pub struct NewsService {
    repo: Arc<dyn NewsRepository>,
    category_repo: Arc<dyn CategoryRepository>,
    identity: Arc<IdentityResolver>,
}

impl NewsService {
    pub fn new(
        repo: Arc<dyn NewsRepository>,
        category_repo: Arc<dyn CategoryRepository>,
        identity: Arc<IdentityResolver>,
    ) -> Self {
        Self {
            repo,
            category_repo,
            identity,
        }
    }

    /// List one page of a category's news.
    ///
    /// `sort` is a client token: `DESC` sorts newest first, anything else
    /// (including `""`) oldest first. A missing category fails before any
    /// news query runs.
    pub async fn filter_news_by_category(
        &self,
        page: u32,
        size: u32,
        author: Option<String>,
        title: Option<String>,
        category_id: i64,
        sort: &str,
    ) -> Result<NewsByCategory, NewsServiceError> {
        let category = self
            .category_repo
            .get_by_id(category_id)
            .await?
            .ok_or_else(|| {
                NewsServiceError::NotFound(messages::not_found("category", category_id))
            })?;

        let request = PageRequest::new(page, size, SortDirection::from_token(sort));
        let filter = NewsFilter { title, author };
        let (news, total) = self
            .repo
            .filter_by_category(category_id, &filter, &request)
            .await?;

        let page = PageResult::new(news, total, &request);
        Ok(NewsByCategory {
            category,
            news: page.page_data,
            total_page: page.total_page,
        })
    }

    /// Publish an article under an existing category
    pub async fn create(
        &self,
        input: NewsInput,
        ctx: &RequestContext,
    ) -> Result<News, NewsServiceError> {
        validate(&input)?;
        self.ensure_category(input.category_id).await?;
        let acting = self.identity.resolve_acting_identity(ctx).await?;

        let mut news = News::new(input.title, input.content, input.category_id);
        news.author = input.author;
        news.description = input.description;
        news.thumbnail = input.thumbnail;
        news.created_by = Some(acting.display_name().to_string());

        let created = self.repo.create(&news).await?;
        tracing::info!("News {} created by {}", created.id, acting.username());
        Ok(created)
    }

    /// Overwrite an article's content fields
    pub async fn update(
        &self,
        id: i64,
        input: NewsInput,
        ctx: &RequestContext,
    ) -> Result<News, NewsServiceError> {
        let mut news = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| NewsServiceError::NotFound(messages::not_found("news", id)))?;
        validate(&input)?;
        self.ensure_category(input.category_id).await?;
        let acting = self.identity.resolve_acting_identity(ctx).await?;

        news.title = input.title;
        news.content = input.content;
        news.author = input.author;
        news.description = input.description;
        news.thumbnail = input.thumbnail;
        news.category_id = input.category_id;
        news.last_modified_by = Some(acting.display_name().to_string());

        Ok(self.repo.update(&news).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<&'static str, NewsServiceError> {
        if !self.repo.exists_by_id(id).await? {
            return Err(NewsServiceError::NotFound(messages::not_found("news", id)));
        }

        self.repo.delete(id).await?;
        tracing::info!("News {} deleted", id);
        Ok(messages::DELETE_SUCCESS)
    }

    /// Read an article, counting the view
    pub async fn get_by_id(&self, id: i64) -> Result<News, NewsServiceError> {
        let not_found = || NewsServiceError::NotFound(messages::not_found("news", id));

        if !self.repo.increment_view(id).await? {
            return Err(not_found());
        }
        self.repo.get_by_id(id).await?.ok_or_else(not_found)
    }

    /// Articles whose title or description contains `keyword`, newest first
    pub async fn search(
        &self,
        keyword: &str,
        page: u32,
        size: u32,
    ) -> Result<PageResult<News>, NewsServiceError> {
        let request = PageRequest::newest_first(page, size);
        let (news, total) = self.repo.search(keyword, &request).await?;
        Ok(PageResult::new(news, total, &request))
    }

    async fn ensure_category(&self, category_id: i64) -> Result<(), NewsServiceError> {
        if self.category_repo.exists_by_id(category_id).await? {
            Ok(())
        } else {
            Err(NewsServiceError::NotFound(messages::not_found(
                "category",
                category_id,
            )))
        }
    }
}

fn validate(input: &NewsInput) -> Result<(), NewsServiceError> {
    if input.title.trim().is_empty() {
        return Err(NewsServiceError::ValidationError(
            "Title cannot be empty".to_string(),
        ));
    }
    if input.content.trim().is_empty() {
        return Err(NewsServiceError::ValidationError(
            "Content cannot be empty".to_string(),
        ));
    }

    let bounded = [
        ("Title", Some(input.title.as_str()), MAX_TITLE_LEN),
        ("Author", input.author.as_deref(), MAX_AUTHOR_LEN),
        ("Thumbnail", input.thumbnail.as_deref(), MAX_THUMBNAIL_LEN),
    ];
    for (field, value, max) in bounded {
        if value.is_some_and(|v| v.chars().count() > max) {
            return Err(NewsServiceError::ValidationError(format!(
                "{} must be at most {} characters",
                field, max
            )));
        }
    }
    Ok(())
}
