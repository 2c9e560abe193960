//! Category repository
//!
//! Database operations for categories.
//!
//! This module provides:
//! - `CategoryRepository` trait defining the interface for category data access
//! - `SqlxCategoryRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Category, PageRequest};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const CATEGORY_COLUMNS: &str =
    "id, category_name, description, created_by, last_modified_by, created_at, updated_at";

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(&self, category: &Category) -> Result<Category>;

    /// Get category by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Category>>;

    /// Get category by name
    async fn get_by_name(&self, name: &str) -> Result<Option<Category>>;

    /// List all categories by name
    async fn list(&self) -> Result<Vec<Category>>;

    /// One page of categories ordered by creation time, plus the total row count
    async fn list_page(&self, request: &PageRequest) -> Result<(Vec<Category>, i64)>;

    /// Update a category
    async fn update(&self, category: &Category) -> Result<Category>;

    /// Delete a category and, through the foreign key, its news
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check if a category exists
    async fn exists_by_id(&self, id: i64) -> Result<bool>;

    /// Check if a category name already exists
    async fn exists_by_name(&self, name: &str) -> Result<bool>;
}

/// SQLx-based category repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxCategoryRepository {
    /// Create a new SQLx category repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(&self, category: &Category) -> Result<Category> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_category_sqlite(self.pool.sqlite()?, category).await,
            DatabaseDriver::Mysql => create_category_mysql(self.pool.mysql()?, category).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_category_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_category_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Category>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_category_by_name_sqlite(self.pool.sqlite()?, name).await,
            DatabaseDriver::Mysql => get_category_by_name_mysql(self.pool.mysql()?, name).await,
        }
    }

    async fn list(&self) -> Result<Vec<Category>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_categories_sqlite(self.pool.sqlite()?).await,
            DatabaseDriver::Mysql => list_categories_mysql(self.pool.mysql()?).await,
        }
    }

    async fn list_page(&self, request: &PageRequest) -> Result<(Vec<Category>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_page_sqlite(self.pool.sqlite()?, request).await,
            DatabaseDriver::Mysql => list_page_mysql(self.pool.mysql()?, request).await,
        }
    }

    async fn update(&self, category: &Category) -> Result<Category> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_category_sqlite(self.pool.sqlite()?, category).await,
            DatabaseDriver::Mysql => update_category_mysql(self.pool.mysql()?, category).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_category_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_category_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool> {
        Ok(self.get_by_id(id).await?.is_some())
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => exists_by_name_sqlite(self.pool.sqlite()?, name).await,
            DatabaseDriver::Mysql => exists_by_name_mysql(self.pool.mysql()?, name).await,
        }
    }
}

fn list_page_sql(request: &PageRequest) -> String {
    let dir = request.direction.as_sql();
    format!(
        "SELECT {} FROM categories ORDER BY created_at {}, id {} LIMIT ? OFFSET ?",
        CATEGORY_COLUMNS, dir, dir
    )
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_category_sqlite(pool: &SqlitePool, category: &Category) -> Result<Category> {
    let result = sqlx::query(
        r#"
        INSERT INTO categories (category_name, description, created_by, last_modified_by,
                                created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&category.name)
    .bind(&category.description)
    .bind(&category.created_by)
    .bind(&category.last_modified_by)
    .bind(category.created_at)
    .bind(category.updated_at)
    .execute(pool)
    .await
    .context("Failed to create category")?;

    Ok(Category {
        id: result.last_insert_rowid(),
        ..category.clone()
    })
}

async fn get_category_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Category>> {
    let row = sqlx::query(&format!("SELECT {} FROM categories WHERE id = ?", CATEGORY_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get category by ID")?;

    row.as_ref().map(row_to_category_sqlite).transpose()
}

async fn get_category_by_name_sqlite(pool: &SqlitePool, name: &str) -> Result<Option<Category>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM categories WHERE category_name = ?",
        CATEGORY_COLUMNS
    ))
    .bind(name)
    .fetch_optional(pool)
    .await
    .context("Failed to get category by name")?;

    row.as_ref().map(row_to_category_sqlite).transpose()
}

async fn list_categories_sqlite(pool: &SqlitePool) -> Result<Vec<Category>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM categories ORDER BY category_name",
        CATEGORY_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list categories")?;

    rows.iter().map(row_to_category_sqlite).collect()
}

async fn list_page_sqlite(pool: &SqlitePool, request: &PageRequest) -> Result<(Vec<Category>, i64)> {
    let count_row = sqlx::query("SELECT COUNT(*) as count FROM categories")
        .fetch_one(pool)
        .await
        .context("Failed to count categories")?;
    let total: i64 = count_row.get("count");

    let rows = sqlx::query(&list_page_sql(request))
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list categories page")?;

    let categories = rows.iter().map(row_to_category_sqlite).collect::<Result<Vec<_>>>()?;
    Ok((categories, total))
}

async fn update_category_sqlite(pool: &SqlitePool, category: &Category) -> Result<Category> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE categories
        SET category_name = ?, description = ?, last_modified_by = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&category.name)
    .bind(&category.description)
    .bind(&category.last_modified_by)
    .bind(now)
    .bind(category.id)
    .execute(pool)
    .await
    .context("Failed to update category")?;

    Ok(Category {
        updated_at: now,
        ..category.clone()
    })
}

async fn delete_category_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete category")?;

    Ok(())
}

async fn exists_by_name_sqlite(pool: &SqlitePool, name: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM categories WHERE category_name = ?")
        .bind(name)
        .fetch_one(pool)
        .await
        .context("Failed to check category name existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

fn row_to_category_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Category> {
    Ok(Category {
        id: row.try_get("id")?,
        name: row.try_get("category_name")?,
        description: row.try_get("description")?,
        created_by: row.try_get("created_by")?,
        last_modified_by: row.try_get("last_modified_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_category_mysql(pool: &MySqlPool, category: &Category) -> Result<Category> {
    let result = sqlx::query(
        r#"
        INSERT INTO categories (category_name, description, created_by, last_modified_by,
                                created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&category.name)
    .bind(&category.description)
    .bind(&category.created_by)
    .bind(&category.last_modified_by)
    .bind(category.created_at)
    .bind(category.updated_at)
    .execute(pool)
    .await
    .context("Failed to create category")?;

    Ok(Category {
        id: result.last_insert_id() as i64,
        ..category.clone()
    })
}

async fn get_category_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Category>> {
    let row = sqlx::query(&format!("SELECT {} FROM categories WHERE id = ?", CATEGORY_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get category by ID")?;

    row.as_ref().map(row_to_category_mysql).transpose()
}

async fn get_category_by_name_mysql(pool: &MySqlPool, name: &str) -> Result<Option<Category>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM categories WHERE category_name = ?",
        CATEGORY_COLUMNS
    ))
    .bind(name)
    .fetch_optional(pool)
    .await
    .context("Failed to get category by name")?;

    row.as_ref().map(row_to_category_mysql).transpose()
}

async fn list_categories_mysql(pool: &MySqlPool) -> Result<Vec<Category>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM categories ORDER BY category_name",
        CATEGORY_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list categories")?;

    rows.iter().map(row_to_category_mysql).collect()
}

async fn list_page_mysql(pool: &MySqlPool, request: &PageRequest) -> Result<(Vec<Category>, i64)> {
    let count_row = sqlx::query("SELECT COUNT(*) as count FROM categories")
        .fetch_one(pool)
        .await
        .context("Failed to count categories")?;
    let total: i64 = count_row.get("count");

    let rows = sqlx::query(&list_page_sql(request))
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list categories page")?;

    let categories = rows.iter().map(row_to_category_mysql).collect::<Result<Vec<_>>>()?;
    Ok((categories, total))
}

async fn update_category_mysql(pool: &MySqlPool, category: &Category) -> Result<Category> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE categories
        SET category_name = ?, description = ?, last_modified_by = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&category.name)
    .bind(&category.description)
    .bind(&category.last_modified_by)
    .bind(now)
    .bind(category.id)
    .execute(pool)
    .await
    .context("Failed to update category")?;

    Ok(Category {
        updated_at: now,
        ..category.clone()
    })
}

async fn delete_category_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete category")?;

    Ok(())
}

async fn exists_by_name_mysql(pool: &MySqlPool, name: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM categories WHERE category_name = ?")
        .bind(name)
        .fetch_one(pool)
        .await
        .context("Failed to check category name existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

fn row_to_category_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Category> {
    Ok(Category {
        id: row.try_get("id")?,
        name: row.try_get("category_name")?,
        description: row.try_get("description")?,
        created_by: row.try_get("created_by")?,
        last_modified_by: row.try_get("last_modified_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, is_unique_violation, migrations};
    use crate::models::SortDirection;
    use chrono::Duration;

    async fn setup_test_repo() -> (DynDatabasePool, SqlxCategoryRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxCategoryRepository::new(pool.clone());
        (pool, repo)
    }

    fn create_test_category(name: &str) -> Category {
        Category::new(name.to_string(), Some(format!("Description for {}", name)))
    }

    #[tokio::test]
    async fn test_create_category() {
        let (_pool, repo) = setup_test_repo().await;
        let mut category = create_test_category("Politics");
        category.created_by = Some("Chief Editor".to_string());

        let created = repo.create(&category).await.expect("Failed to create category");

        assert!(created.id > 0);
        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Politics");
        assert_eq!(fetched.created_by.as_deref(), Some("Chief Editor"));
    }

    #[tokio::test]
    async fn test_get_by_name_and_exists() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo.create(&create_test_category("Sport")).await.unwrap();

        assert_eq!(repo.get_by_name("Sport").await.unwrap().unwrap().id, created.id);
        assert!(repo.exists_by_name("Sport").await.unwrap());
        assert!(!repo.exists_by_name("Weather").await.unwrap());
        assert!(repo.exists_by_id(created.id).await.unwrap());
        assert!(!repo.exists_by_id(999).await.unwrap());
    }

    #[tokio::test]
    async fn test_unique_name_constraint() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_category("Sport")).await.unwrap();

        let err = repo.create(&create_test_category("Sport")).await.unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_update_category() {
        let (_pool, repo) = setup_test_repo().await;
        let mut category = repo.create(&create_test_category("Old")).await.unwrap();

        category.name = "New".to_string();
        category.description = None;
        category.last_modified_by = Some("Desk".to_string());
        repo.update(&category).await.unwrap();

        let fetched = repo.get_by_id(category.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "New");
        assert!(fetched.description.is_none());
        assert_eq!(fetched.last_modified_by.as_deref(), Some("Desk"));
    }

    #[tokio::test]
    async fn test_delete_category() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo.create(&create_test_category("Gone")).await.unwrap();

        repo.delete(created.id).await.unwrap();

        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_page_and_list() {
        let (_pool, repo) = setup_test_repo().await;
        let base = Utc::now();
        for (i, name) in ["Beta", "Alpha", "Gamma"].iter().enumerate() {
            let mut category = create_test_category(name);
            category.created_at = base + Duration::seconds(i as i64);
            repo.create(&category).await.unwrap();
        }

        let (page, total) = repo
            .list_page(&PageRequest::new(0, 10, SortDirection::Desc))
            .await
            .unwrap();
        assert_eq!(total, 3);
        let names: Vec<_> = page.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Gamma", "Alpha", "Beta"]);

        let all: Vec<_> = repo.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(all, vec!["Alpha", "Beta", "Gamma"]);
    }
}
