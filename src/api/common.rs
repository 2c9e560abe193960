//! Common API utilities and shared types

use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;

/// Paging query parameters (`page` is 0-based)
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
}

impl PageQuery {
    /// Page index and size, with the size defaulted and clamped to `1..=max_size`
    pub fn resolve(&self, config: &PaginationConfig) -> (u32, u32) {
        let size = self
            .size
            .unwrap_or(config.default_size)
            .clamp(1, config.max_size.max(1));
        (self.page.unwrap_or(0), size)
    }
}

/// Plain notification body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
