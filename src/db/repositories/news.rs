//! News repository
//!
//! Database operations for news articles.
//!
//! This module provides:
//! - `NewsRepository` trait defining the interface for article data access
//! - `SqlxNewsRepository` implementing the trait for SQLite and MySQL
//!
//! Listing queries take a [`PageRequest`]; the `ORDER BY` direction comes from
//! the [`SortDirection`](crate::models::SortDirection) enum, never from client text.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{News, NewsFilter, PageRequest};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const NEWS_COLUMNS: &str = "id, title, content, author, description, thumbnail, view, \
     category_id, created_by, last_modified_by, created_at, updated_at";

/// News repository trait
#[async_trait]
pub trait NewsRepository: Send + Sync {
    /// Create a new article
    async fn create(&self, news: &News) -> Result<News>;

    /// Get article by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<News>>;

    /// Update an article
    async fn update(&self, news: &News) -> Result<News>;

    /// Delete an article
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check if an article exists
    async fn exists_by_id(&self, id: i64) -> Result<bool>;

    /// Bump the view counter. Returns false when the article does not exist.
    async fn increment_view(&self, id: i64) -> Result<bool>;

    /// One page of a category's articles matching the optional title/author
    /// substrings, plus the total number of matches
    async fn filter_by_category(
        &self,
        category_id: i64,
        filter: &NewsFilter,
        request: &PageRequest,
    ) -> Result<(Vec<News>, i64)>;

    /// One page of articles whose title or description contains `keyword`,
    /// plus the total number of matches
    async fn search(&self, keyword: &str, request: &PageRequest) -> Result<(Vec<News>, i64)>;
}

/// SQLx-based news repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxNewsRepository {
    pool: DynDatabasePool,
}

impl SqlxNewsRepository {
    /// Create a new SQLx news repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NewsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NewsRepository for SqlxNewsRepository {
    async fn create(&self, news: &News) -> Result<News> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_news_sqlite(self.pool.sqlite()?, news).await,
            DatabaseDriver::Mysql => create_news_mysql(self.pool.mysql()?, news).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<News>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_news_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_news_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn update(&self, news: &News) -> Result<News> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_news_sqlite(self.pool.sqlite()?, news).await,
            DatabaseDriver::Mysql => update_news_mysql(self.pool.mysql()?, news).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let sql = "DELETE FROM news WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .context("Failed to delete news")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(id)
                    .execute(self.pool.mysql()?)
                    .await
                    .context("Failed to delete news")?;
            }
        }
        Ok(())
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool> {
        Ok(self.get_by_id(id).await?.is_some())
    }

    async fn increment_view(&self, id: i64) -> Result<bool> {
        let sql = "UPDATE news SET view = view + 1 WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to increment news view")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to increment news view")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn filter_by_category(
        &self,
        category_id: i64,
        filter: &NewsFilter,
        request: &PageRequest,
    ) -> Result<(Vec<News>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                filter_by_category_sqlite(self.pool.sqlite()?, category_id, filter, request).await
            }
            DatabaseDriver::Mysql => {
                filter_by_category_mysql(self.pool.mysql()?, category_id, filter, request).await
            }
        }
    }

    async fn search(&self, keyword: &str, request: &PageRequest) -> Result<(Vec<News>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => search_news_sqlite(self.pool.sqlite()?, keyword, request).await,
            DatabaseDriver::Mysql => search_news_mysql(self.pool.mysql()?, keyword, request).await,
        }
    }
}

/// `%value%` for a non-blank filter, `None` when the filter is absent or blank
fn like_pattern(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| format!("%{}%", v))
}

const FILTER_WHERE: &str = "WHERE category_id = ? \
     AND (? IS NULL OR title LIKE ?) \
     AND (? IS NULL OR author LIKE ?)";

const SEARCH_WHERE: &str = "WHERE title LIKE ? OR description LIKE ?";

fn page_sql(where_clause: &str, request: &PageRequest) -> String {
    let dir = request.direction.as_sql();
    format!(
        "SELECT {} FROM news {} ORDER BY created_at {}, id {} LIMIT ? OFFSET ?",
        NEWS_COLUMNS, where_clause, dir, dir
    )
}

fn count_sql(where_clause: &str) -> String {
    format!("SELECT COUNT(*) as count FROM news {}", where_clause)
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_news_sqlite(pool: &SqlitePool, news: &News) -> Result<News> {
    let result = sqlx::query(
        r#"
        INSERT INTO news (title, content, author, description, thumbnail, view, category_id,
                          created_by, last_modified_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&news.title)
    .bind(&news.content)
    .bind(&news.author)
    .bind(&news.description)
    .bind(&news.thumbnail)
    .bind(news.view)
    .bind(news.category_id)
    .bind(&news.created_by)
    .bind(&news.last_modified_by)
    .bind(news.created_at)
    .bind(news.updated_at)
    .execute(pool)
    .await
    .context("Failed to create news")?;

    Ok(News {
        id: result.last_insert_rowid(),
        ..news.clone()
    })
}

async fn get_news_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<News>> {
    let row = sqlx::query(&format!("SELECT {} FROM news WHERE id = ?", NEWS_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get news by ID")?;

    row.as_ref().map(row_to_news_sqlite).transpose()
}

async fn update_news_sqlite(pool: &SqlitePool, news: &News) -> Result<News> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE news
        SET title = ?, content = ?, author = ?, description = ?, thumbnail = ?,
            category_id = ?, last_modified_by = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&news.title)
    .bind(&news.content)
    .bind(&news.author)
    .bind(&news.description)
    .bind(&news.thumbnail)
    .bind(news.category_id)
    .bind(&news.last_modified_by)
    .bind(now)
    .bind(news.id)
    .execute(pool)
    .await
    .context("Failed to update news")?;

    Ok(News {
        updated_at: now,
        ..news.clone()
    })
}

async fn filter_by_category_sqlite(
    pool: &SqlitePool,
    category_id: i64,
    filter: &NewsFilter,
    request: &PageRequest,
) -> Result<(Vec<News>, i64)> {
    let title = like_pattern(filter.title.as_deref());
    let author = like_pattern(filter.author.as_deref());

    let count_row = sqlx::query(&count_sql(FILTER_WHERE))
        .bind(category_id)
        .bind(&title)
        .bind(&title)
        .bind(&author)
        .bind(&author)
        .fetch_one(pool)
        .await
        .context("Failed to count news by category")?;
    let total: i64 = count_row.get("count");

    let rows = sqlx::query(&page_sql(FILTER_WHERE, request))
        .bind(category_id)
        .bind(&title)
        .bind(&title)
        .bind(&author)
        .bind(&author)
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(pool)
        .await
        .context("Failed to filter news by category")?;

    let news = rows.iter().map(row_to_news_sqlite).collect::<Result<Vec<_>>>()?;
    Ok((news, total))
}

async fn search_news_sqlite(
    pool: &SqlitePool,
    keyword: &str,
    request: &PageRequest,
) -> Result<(Vec<News>, i64)> {
    let pattern = format!("%{}%", keyword.trim());

    let count_row = sqlx::query(&count_sql(SEARCH_WHERE))
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(pool)
        .await
        .context("Failed to count news search results")?;
    let total: i64 = count_row.get("count");

    let rows = sqlx::query(&page_sql(SEARCH_WHERE, request))
        .bind(&pattern)
        .bind(&pattern)
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(pool)
        .await
        .context("Failed to search news")?;

    let news = rows.iter().map(row_to_news_sqlite).collect::<Result<Vec<_>>>()?;
    Ok((news, total))
}

fn row_to_news_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<News> {
    Ok(News {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        author: row.try_get("author")?,
        description: row.try_get("description")?,
        thumbnail: row.try_get("thumbnail")?,
        view: row.try_get("view")?,
        category_id: row.try_get("category_id")?,
        created_by: row.try_get("created_by")?,
        last_modified_by: row.try_get("last_modified_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_news_mysql(pool: &MySqlPool, news: &News) -> Result<News> {
    let result = sqlx::query(
        r#"
        INSERT INTO news (title, content, author, description, thumbnail, view, category_id,
                          created_by, last_modified_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&news.title)
    .bind(&news.content)
    .bind(&news.author)
    .bind(&news.description)
    .bind(&news.thumbnail)
    .bind(news.view)
    .bind(news.category_id)
    .bind(&news.created_by)
    .bind(&news.last_modified_by)
    .bind(news.created_at)
    .bind(news.updated_at)
    .execute(pool)
    .await
    .context("Failed to create news")?;

    Ok(News {
        id: result.last_insert_id() as i64,
        ..news.clone()
    })
}

async fn get_news_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<News>> {
    let row = sqlx::query(&format!("SELECT {} FROM news WHERE id = ?", NEWS_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get news by ID")?;

    row.as_ref().map(row_to_news_mysql).transpose()
}

async fn update_news_mysql(pool: &MySqlPool, news: &News) -> Result<News> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE news
        SET title = ?, content = ?, author = ?, description = ?, thumbnail = ?,
            category_id = ?, last_modified_by = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&news.title)
    .bind(&news.content)
    .bind(&news.author)
    .bind(&news.description)
    .bind(&news.thumbnail)
    .bind(news.category_id)
    .bind(&news.last_modified_by)
    .bind(now)
    .bind(news.id)
    .execute(pool)
    .await
    .context("Failed to update news")?;

    Ok(News {
        updated_at: now,
        ..news.clone()
    })
}

async fn filter_by_category_mysql(
    pool: &MySqlPool,
    category_id: i64,
    filter: &NewsFilter,
    request: &PageRequest,
) -> Result<(Vec<News>, i64)> {
    let title = like_pattern(filter.title.as_deref());
    let author = like_pattern(filter.author.as_deref());

    let count_row = sqlx::query(&count_sql(FILTER_WHERE))
        .bind(category_id)
        .bind(&title)
        .bind(&title)
        .bind(&author)
        .bind(&author)
        .fetch_one(pool)
        .await
        .context("Failed to count news by category")?;
    let total: i64 = count_row.get("count");

    let rows = sqlx::query(&page_sql(FILTER_WHERE, request))
        .bind(category_id)
        .bind(&title)
        .bind(&title)
        .bind(&author)
        .bind(&author)
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(pool)
        .await
        .context("Failed to filter news by category")?;

    let news = rows.iter().map(row_to_news_mysql).collect::<Result<Vec<_>>>()?;
    Ok((news, total))
}

async fn search_news_mysql(
    pool: &MySqlPool,
    keyword: &str,
    request: &PageRequest,
) -> Result<(Vec<News>, i64)> {
    let pattern = format!("%{}%", keyword.trim());

    let count_row = sqlx::query(&count_sql(SEARCH_WHERE))
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(pool)
        .await
        .context("Failed to count news search results")?;
    let total: i64 = count_row.get("count");

    let rows = sqlx::query(&page_sql(SEARCH_WHERE, request))
        .bind(&pattern)
        .bind(&pattern)
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(pool)
        .await
        .context("Failed to search news")?;

    let news = rows.iter().map(row_to_news_mysql).collect::<Result<Vec<_>>>()?;
    Ok((news, total))
}

fn row_to_news_mysql(row: &sqlx::mysql::MySqlRow) -> Result<News> {
    Ok(News {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        author: row.try_get("author")?,
        description: row.try_get("description")?,
        thumbnail: row.try_get("thumbnail")?,
        view: row.try_get("view")?,
        category_id: row.try_get("category_id")?,
        created_by: row.try_get("created_by")?,
        last_modified_by: row.try_get("last_modified_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{CategoryRepository, SqlxCategoryRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Category, SortDirection};
    use chrono::Duration;

    async fn setup_test_repo() -> (SqlxNewsRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let category = SqlxCategoryRepository::new(pool.clone())
            .create(&Category::new("World".to_string(), None))
            .await
            .expect("Failed to create category");
        (SqlxNewsRepository::new(pool), category.id)
    }

    async fn seed(repo: &SqlxNewsRepository, category_id: i64, entries: &[(&str, Option<&str>)]) {
        let base = Utc::now();
        for (i, (title, author)) in entries.iter().enumerate() {
            let mut news = News::new(title.to_string(), "body".to_string(), category_id);
            news.author = author.map(str::to_string);
            news.created_at = base + Duration::seconds(i as i64);
            repo.create(&news).await.expect("Failed to create news");
        }
    }

    fn titles(news: &[News]) -> Vec<&str> {
        news.iter().map(|n| n.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (repo, category_id) = setup_test_repo().await;
        let mut news = News::new("Headline".to_string(), "Body".to_string(), category_id);
        news.thumbnail = Some("/img/a.png".to_string());

        let created = repo.create(&news).await.unwrap();
        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.title, "Headline");
        assert_eq!(fetched.view, 0);
        assert_eq!(fetched.thumbnail.as_deref(), Some("/img/a.png"));
    }

    #[tokio::test]
    async fn test_create_with_missing_category_fails() {
        let (repo, _) = setup_test_repo().await;
        let news = News::new("Orphan".to_string(), "Body".to_string(), 999);

        assert!(repo.create(&news).await.is_err());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (repo, category_id) = setup_test_repo().await;
        let mut news = repo
            .create(&News::new("Draft".to_string(), "Body".to_string(), category_id))
            .await
            .unwrap();

        news.title = "Final".to_string();
        news.last_modified_by = Some("Desk".to_string());
        repo.update(&news).await.unwrap();
        assert_eq!(repo.get_by_id(news.id).await.unwrap().unwrap().title, "Final");

        repo.delete(news.id).await.unwrap();
        assert!(!repo.exists_by_id(news.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_increment_view() {
        let (repo, category_id) = setup_test_repo().await;
        let news = repo
            .create(&News::new("Popular".to_string(), "Body".to_string(), category_id))
            .await
            .unwrap();

        assert!(repo.increment_view(news.id).await.unwrap());
        assert!(repo.increment_view(news.id).await.unwrap());
        assert!(!repo.increment_view(999).await.unwrap());

        assert_eq!(repo.get_by_id(news.id).await.unwrap().unwrap().view, 2);
    }

    #[tokio::test]
    async fn test_filter_by_category_sorting() {
        let (repo, category_id) = setup_test_repo().await;
        seed(&repo, category_id, &[("first", None), ("second", None), ("third", None)]).await;

        let asc = PageRequest::new(0, 10, SortDirection::Asc);
        let (news, total) = repo
            .filter_by_category(category_id, &NewsFilter::default(), &asc)
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(titles(&news), vec!["first", "second", "third"]);

        let desc = PageRequest::new(0, 2, SortDirection::Desc);
        let (news, total) = repo
            .filter_by_category(category_id, &NewsFilter::default(), &desc)
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(titles(&news), vec!["third", "second"]);
    }

    #[tokio::test]
    async fn test_filter_by_title_and_author() {
        let (repo, category_id) = setup_test_repo().await;
        seed(
            &repo,
            category_id,
            &[
                ("Election night", Some("Alice")),
                ("Election recount", Some("Bob")),
                ("Weather", Some("Alice")),
                ("Untitled election", None),
            ],
        )
        .await;
        let request = PageRequest::new(0, 10, SortDirection::Asc);

        let filter = NewsFilter {
            title: Some("Election".to_string()),
            author: None,
        };
        let (news, total) = repo.filter_by_category(category_id, &filter, &request).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(news.len(), 3);

        let filter = NewsFilter {
            title: Some("election".to_string()),
            author: Some("Alice".to_string()),
        };
        let (news, _) = repo.filter_by_category(category_id, &filter, &request).await.unwrap();
        assert_eq!(titles(&news), vec!["Election night"]);

        // Blank filters behave like absent ones
        let filter = NewsFilter {
            title: Some(String::new()),
            author: Some("  ".to_string()),
        };
        let (_, total) = repo.filter_by_category(category_id, &filter, &request).await.unwrap();
        assert_eq!(total, 4);
    }

    #[tokio::test]
    async fn test_filter_other_category_is_empty() {
        let (repo, category_id) = setup_test_repo().await;
        seed(&repo, category_id, &[("only", None)]).await;

        let (news, total) = repo
            .filter_by_category(category_id + 1, &NewsFilter::default(), &PageRequest::newest_first(0, 10))
            .await
            .unwrap();
        assert!(news.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_search() {
        let (repo, category_id) = setup_test_repo().await;
        let mut described = News::new("Markets".to_string(), "Body".to_string(), category_id);
        described.description = Some("Stocks rally after budget".to_string());
        repo.create(&described).await.unwrap();
        seed(&repo, category_id, &[("Budget passes", None), ("Sport roundup", None)]).await;

        let (news, total) = repo.search("budget", &PageRequest::newest_first(0, 10)).await.unwrap();

        assert_eq!(total, 2);
        assert_eq!(news.len(), 2);
        assert!(news.iter().all(|n| n.title != "Sport roundup"));
    }
}
