//! News model
//!
//! An article published under exactly one category.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// News article entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct News {
    /// Unique identifier
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Display name of the writer, not necessarily a username
    pub author: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    /// View counter
    pub view: i64,
    /// Foreign key into `categories`
    pub category_id: i64,
    pub created_by: Option<String>,
    pub last_modified_by: Option<String>,
    /// Creation timestamp, the default sort key
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl News {
    /// Create a new article with zero views. The ID is assigned by the database.
    pub fn new(title: String, content: String, category_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            title,
            content,
            author: None,
            description: None,
            thumbnail: None,
            view: 0,
            category_id,
            created_by: None,
            last_modified_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating or updating an article
#[derive(Debug, Clone, Deserialize)]
pub struct NewsInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub category_id: i64,
}

/// Optional filters for listing news inside one category
#[derive(Debug, Clone, Default)]
pub struct NewsFilter {
    /// Substring of the title
    pub title: Option<String>,
    /// Substring of the author
    pub author: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_news_new() {
        let news = News::new("Headline".to_string(), "Body".to_string(), 7);

        assert_eq!(news.id, 0);
        assert_eq!(news.view, 0);
        assert_eq!(news.category_id, 7);
        assert!(news.author.is_none());
    }

    #[test]
    fn test_news_input_from_json() {
        let input: NewsInput = serde_json::from_str(
            r#"{"title":"T","content":"C","author":"Desk","category_id":3}"#,
        )
        .unwrap();

        assert_eq!(input.author.as_deref(), Some("Desk"));
        assert!(input.thumbnail.is_none());
        assert_eq!(input.category_id, 3);
    }
}
