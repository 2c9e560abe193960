//! User repository
//!
//! Database operations for users.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{PageRequest, User};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const USER_COLUMNS: &str = "id, username, password_hash, full_name, email, phone, address, \
     gender, avatar, birthday, role_id, created_by, last_modified_by, created_at, updated_at";

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Check if a username is taken
    async fn exists_by_username(&self, username: &str) -> Result<bool>;

    /// Update the mutable profile fields of a user
    async fn update(&self, user: &User) -> Result<User>;

    /// One page of users ordered by creation time, plus the total row count
    async fn list_page(&self, request: &PageRequest) -> Result<(Vec<User>, i64)>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_user_sqlite(self.pool.sqlite()?, user).await,
            DatabaseDriver::Mysql => create_user_mysql(self.pool.mysql()?, user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_user_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_user_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_username_sqlite(self.pool.sqlite()?, username).await
            }
            DatabaseDriver::Mysql => get_user_by_username_mysql(self.pool.mysql()?, username).await,
        }
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                exists_by_username_sqlite(self.pool.sqlite()?, username).await
            }
            DatabaseDriver::Mysql => exists_by_username_mysql(self.pool.mysql()?, username).await,
        }
    }

    async fn update(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_user_sqlite(self.pool.sqlite()?, user).await,
            DatabaseDriver::Mysql => update_user_mysql(self.pool.mysql()?, user).await,
        }
    }

    async fn list_page(&self, request: &PageRequest) -> Result<(Vec<User>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_users_sqlite(self.pool.sqlite()?, request).await,
            DatabaseDriver::Mysql => list_users_mysql(self.pool.mysql()?, request).await,
        }
    }
}

fn list_users_sql(request: &PageRequest) -> String {
    let dir = request.direction.as_sql();
    format!(
        "SELECT {} FROM users ORDER BY created_at {}, id {} LIMIT ? OFFSET ?",
        USER_COLUMNS, dir, dir
    )
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, full_name, email, phone, address, gender,
                           avatar, birthday, role_id, created_by, last_modified_by,
                           created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(&user.full_name)
    .bind(&user.email)
    .bind(&user.phone)
    .bind(&user.address)
    .bind(&user.gender)
    .bind(&user.avatar)
    .bind(user.birthday)
    .bind(user.role_id)
    .bind(&user.created_by)
    .bind(&user.last_modified_by)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_rowid(),
        ..user.clone()
    })
}

async fn get_user_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    row.as_ref().map(row_to_user_sqlite).transpose()
}

async fn get_user_by_username_sqlite(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS))
        .bind(username)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by username")?;

    row.as_ref().map(row_to_user_sqlite).transpose()
}

async fn exists_by_username_sqlite(pool: &SqlitePool, username: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM users WHERE username = ?")
        .bind(username)
        .fetch_one(pool)
        .await
        .context("Failed to check username existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

async fn update_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE users
        SET full_name = ?, email = ?, phone = ?, address = ?, gender = ?, avatar = ?,
            birthday = ?, role_id = ?, last_modified_by = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.full_name)
    .bind(&user.email)
    .bind(&user.phone)
    .bind(&user.address)
    .bind(&user.gender)
    .bind(&user.avatar)
    .bind(user.birthday)
    .bind(user.role_id)
    .bind(&user.last_modified_by)
    .bind(now)
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    Ok(User {
        updated_at: now,
        ..user.clone()
    })
}

async fn count_users_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;

    Ok(row.get("count"))
}

async fn list_users_sqlite(pool: &SqlitePool, request: &PageRequest) -> Result<(Vec<User>, i64)> {
    let total = count_users_sqlite(pool).await?;

    let rows = sqlx::query(&list_users_sql(request))
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    let users = rows.iter().map(row_to_user_sqlite).collect::<Result<Vec<_>>>()?;
    Ok((users, total))
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        gender: row.try_get("gender")?,
        avatar: row.try_get("avatar")?,
        birthday: row.try_get("birthday")?,
        role_id: row.try_get("role_id")?,
        created_by: row.try_get("created_by")?,
        last_modified_by: row.try_get("last_modified_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, full_name, email, phone, address, gender,
                           avatar, birthday, role_id, created_by, last_modified_by,
                           created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(&user.full_name)
    .bind(&user.email)
    .bind(&user.phone)
    .bind(&user.address)
    .bind(&user.gender)
    .bind(&user.avatar)
    .bind(user.birthday)
    .bind(user.role_id)
    .bind(&user.created_by)
    .bind(&user.last_modified_by)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_id() as i64,
        ..user.clone()
    })
}

async fn get_user_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    row.as_ref().map(row_to_user_mysql).transpose()
}

async fn get_user_by_username_mysql(pool: &MySqlPool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS))
        .bind(username)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by username")?;

    row.as_ref().map(row_to_user_mysql).transpose()
}

async fn exists_by_username_mysql(pool: &MySqlPool, username: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM users WHERE username = ?")
        .bind(username)
        .fetch_one(pool)
        .await
        .context("Failed to check username existence")?;

    let count: i64 = row.get("count");
    Ok(count > 0)
}

async fn update_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE users
        SET full_name = ?, email = ?, phone = ?, address = ?, gender = ?, avatar = ?,
            birthday = ?, role_id = ?, last_modified_by = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.full_name)
    .bind(&user.email)
    .bind(&user.phone)
    .bind(&user.address)
    .bind(&user.gender)
    .bind(&user.avatar)
    .bind(user.birthday)
    .bind(user.role_id)
    .bind(&user.last_modified_by)
    .bind(now)
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    Ok(User {
        updated_at: now,
        ..user.clone()
    })
}

async fn count_users_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;

    Ok(row.get("count"))
}

async fn list_users_mysql(pool: &MySqlPool, request: &PageRequest) -> Result<(Vec<User>, i64)> {
    let total = count_users_mysql(pool).await?;

    let rows = sqlx::query(&list_users_sql(request))
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    let users = rows.iter().map(row_to_user_mysql).collect::<Result<Vec<_>>>()?;
    Ok((users, total))
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        gender: row.try_get("gender")?,
        avatar: row.try_get("avatar")?,
        birthday: row.try_get("birthday")?,
        role_id: row.try_get("role_id")?,
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
    use crate::models::{Role, SortDirection};
    use chrono::{Duration, NaiveDate};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxUserRepository::new(pool.clone());
        (pool, repo)
    }

    fn create_test_user(username: &str) -> User {
        User::new(
            username.to_string(),
            "hashed_password".to_string(),
            format!("{} Full", username),
            Role::User,
        )
    }

    #[tokio::test]
    async fn test_create_user() {
        let (_pool, repo) = setup_test_repo().await;
        let mut user = create_test_user("reporter");
        user.birthday = NaiveDate::from_ymd_opt(1991, 3, 4);
        user.email = Some("reporter@example.com".to_string());

        let created = repo.create(&user).await.expect("Failed to create user");

        assert!(created.id > 0);
        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.username, "reporter");
        assert_eq!(fetched.birthday, NaiveDate::from_ymd_opt(1991, 3, 4));
        assert_eq!(fetched.email.as_deref(), Some("reporter@example.com"));
        assert_eq!(fetched.role_id, Role::User.id());
    }

    #[tokio::test]
    async fn test_get_user_by_id_not_found() {
        let (_pool, repo) = setup_test_repo().await;
        assert!(repo.get_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_user_by_username() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_user("desk")).await.unwrap();

        let found = repo.get_by_username("desk").await.unwrap();
        assert!(found.is_some());
        assert!(repo.get_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_exists_by_username() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_user("desk")).await.unwrap();

        assert!(repo.exists_by_username("desk").await.unwrap());
        assert!(!repo.exists_by_username("other").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_user() {
        let (_pool, repo) = setup_test_repo().await;
        let mut user = repo.create(&create_test_user("desk")).await.unwrap();

        user.full_name = "Renamed".to_string();
        user.phone = Some("0123".to_string());
        user.last_modified_by = Some("Editor".to_string());
        repo.update(&user).await.expect("Failed to update user");

        let fetched = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(fetched.full_name, "Renamed");
        assert_eq!(fetched.phone.as_deref(), Some("0123"));
        assert_eq!(fetched.last_modified_by.as_deref(), Some("Editor"));
    }

    #[tokio::test]
    async fn test_unique_username_constraint() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_user("dup")).await.unwrap();

        let err = repo.create(&create_test_user("dup")).await.unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_username_matching_ignores_case() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_user("Desk")).await.unwrap();

        assert!(repo.exists_by_username("desk").await.unwrap());
        let err = repo.create(&create_test_user("DESK")).await.unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_unknown_role_rejected() {
        let (_pool, repo) = setup_test_repo().await;
        let mut user = create_test_user("ghost");
        user.role_id = 42;

        assert!(repo.create(&user).await.is_err());
    }

    #[tokio::test]
    async fn test_list_page_newest_first() {
        let (_pool, repo) = setup_test_repo().await;
        let base = Utc::now();
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            let mut user = create_test_user(name);
            user.created_at = base + Duration::seconds(i as i64);
            repo.create(&user).await.unwrap();
        }

        let request = PageRequest::new(0, 2, SortDirection::Desc);
        let (users, total) = repo.list_page(&request).await.unwrap();

        assert_eq!(total, 3);
        let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["c", "b"]);

        let (rest, _) = repo.list_page(&PageRequest::new(1, 2, SortDirection::Desc)).await.unwrap();
        assert_eq!(rest.len(), 1);
    }
}
