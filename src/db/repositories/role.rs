//! Role repository
//!
//! Read access to the seeded `roles` table. Users reference a role by
//! `role_id`; callers load it on demand through this repository.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Role, RoleRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Role repository trait
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Get role by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<RoleRecord>>;
}

/// SQLx-based role repository implementation
pub struct SqlxRoleRepository {
    pool: DynDatabasePool,
}

impl SqlxRoleRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn RoleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl RoleRepository for SqlxRoleRepository {
    async fn get_by_id(&self, id: i64) -> Result<Option<RoleRecord>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_role_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_role_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }
}

fn to_record(id: i64, role_name: &str) -> Result<RoleRecord> {
    let role = Role::from_str(role_name)
        .with_context(|| format!("Unknown role name stored for id {}", id))?;
    Ok(RoleRecord { id, role })
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn get_role_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<RoleRecord>> {
    let row = sqlx::query("SELECT id, role_name FROM roles WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get role by ID")?;

    row.map(|row| to_record(row.get("id"), row.get::<String, _>("role_name").as_str()))
        .transpose()
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn get_role_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<RoleRecord>> {
    let row = sqlx::query("SELECT id, role_name FROM roles WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get role by ID")?;

    row.map(|row| to_record(row.get("id"), row.get::<String, _>("role_name").as_str()))
        .transpose()
}
