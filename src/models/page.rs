//! Paging and sorting types
//!
//! `PageRequest` carries a 0-based page index, a size and a sort direction on
//! `created_at`. Repositories answer with the items of that page plus the total
//! row count, and `PageResult` derives the paging metadata from both.

use serde::Serialize;

use super::{Category, News};

/// Sort direction on the creation timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Resolve a client supplied token.
    ///
    /// `DESC` (any case) is descending. Everything else, including `ASC`, the
    /// empty string and unknown words, is ascending.
    pub fn from_token(token: &str) -> Self {
        if token.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    /// SQL keyword for an `ORDER BY` clause
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A request for one page of results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 0-based page index
    pub page: u32,
    /// Rows per page, at least 1
    pub size: u32,
    pub direction: SortDirection,
}

impl PageRequest {
    pub fn new(page: u32, size: u32, direction: SortDirection) -> Self {
        Self {
            page,
            size: size.max(1),
            direction,
        }
    }

    /// Newest first, the order used by the admin listings
    pub fn newest_first(page: u32, size: u32) -> Self {
        Self::new(page, size, SortDirection::Desc)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }
}

/// Number of pages needed for `total` rows: `ceil(total / size)`, 0 when empty.
pub fn total_pages(total: i64, size: u32) -> u32 {
    if total <= 0 || size == 0 {
        return 0;
    }
    let size = i64::from(size);
    u32::try_from((total + size - 1) / size).unwrap_or(u32::MAX)
}

/// One page of results plus its paging metadata
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PageResult<T> {
    /// Requested page index
    pub page: u32,
    pub size: u32,
    pub total_page: u32,
    pub current_page: u32,
    pub page_data: Vec<T>,
}

impl<T> PageResult<T> {
    /// Assemble a page from repository output
    pub fn new(page_data: Vec<T>, total: i64, request: &PageRequest) -> Self {
        Self {
            page: request.page,
            size: request.size,
            total_page: total_pages(total, request.size),
            current_page: request.page,
            page_data,
        }
    }
}

/// News of one category, as returned by the category filter
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewsByCategory {
    pub category: Category,
    pub news: Vec<News>,
    pub total_page: u32,
}
