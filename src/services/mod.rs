//! Services layer - Business logic
//!
//! Services are responsible for:
//! - Implementing business rules (uniqueness, authorization, paging)
//! - Resolving the acting identity from the request context
//! - Coordinating repositories and shaping results

pub mod category;
pub mod identity;
pub mod messages;
pub mod news;
pub mod password;
pub mod token;
pub mod user;

#[cfg(test)]
pub(crate) mod testing;

pub use category::{CategoryService, CategoryServiceError};
pub use identity::{authorize_mutation, Identity, IdentityError, IdentityResolver, RequestContext};
pub use news::{NewsService, NewsServiceError};
pub use password::{hash_password, verify_password};
pub use token::{JwtTokenService, TokenService};
pub use user::{UserService, UserServiceError};
