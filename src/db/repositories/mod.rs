//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod category;
pub mod news;
pub mod role;
pub mod user;

pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use news::{NewsRepository, SqlxNewsRepository};
pub use role::{RoleRepository, SqlxRoleRepository};
pub use user::{SqlxUserRepository, UserRepository};
