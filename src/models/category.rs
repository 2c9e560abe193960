//! Category model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category entity. Names are unique across the table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    /// Unique identifier
    pub id: i64,
    /// Category name (unique)
    pub name: String,
    pub description: Option<String>,
    pub created_by: Option<String>,
    pub last_modified_by: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Create a new Category. The ID is assigned by the database.
    pub fn new(name: String, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            name,
            description,
            created_by: None,
            last_modified_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a new category
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Input for updating a category (both fields overwrite)
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}
