//! Data models
//!
//! Data structures used throughout the newsdesk backend:
//! - Database entities (User, Role, Category, News)
//! - Service inputs
//! - Paging requests and results

mod category;
mod news;
mod page;
mod user;

pub use category::{Category, CreateCategoryInput, UpdateCategoryInput};
pub use news::{News, NewsFilter, NewsInput};
pub use page::{total_pages, NewsByCategory, PageRequest, PageResult, SortDirection};
pub use user::{
    parse_birthday, CreateUserInput, Role, RoleRecord, UpdateUserInput, User, BIRTHDAY_FORMAT,
};
