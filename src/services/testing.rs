//! Shared fixtures for service tests: a migrated in-memory database, real
//! repositories and a token service.

use std::sync::Arc;

use crate::db::repositories::{
    CategoryRepository, NewsRepository, SqlxCategoryRepository,
    SqlxNewsRepository, SqlxRoleRepository, SqlxUserRepository, UserRepository,
};
use crate::db::{create_test_pool, migrations, DynDatabasePool};
use crate::models::{Category, News, Role, User};
use crate::services::identity::{IdentityResolver, RequestContext};
use crate::services::password::hash_password;
use crate::services::token::{JwtTokenService, TokenService};
use crate::services::{CategoryService, NewsService, UserService};

pub const TEST_PASSWORD: &str = "password";

pub struct TestEnv {
    pub pool: DynDatabasePool,
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub news: Arc<dyn NewsRepository>,
    pub tokens: Arc<JwtTokenService>,
    pub identity: Arc<IdentityResolver>,
}

impl TestEnv {
    pub async fn new() -> Self {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::boxed(pool.clone());
        let tokens = Arc::new(JwtTokenService::new("test-secret", "newsdesk", 3600));
        let identity = Arc::new(IdentityResolver::new(
            users.clone(),
            SqlxRoleRepository::boxed(pool.clone()),
            tokens.clone(),
        ));

        Self {
            categories: SqlxCategoryRepository::boxed(pool.clone()),
            news: SqlxNewsRepository::boxed(pool.clone()),
            pool,
            users,
            tokens,
            identity,
        }
    }

    pub fn user_service(&self) -> UserService {
        UserService::new(self.users.clone(), self.identity.clone(), self.tokens.clone())
    }

    pub fn category_service(&self) -> CategoryService {
        CategoryService::new(self.categories.clone(), self.identity.clone())
    }

    pub fn news_service(&self) -> NewsService {
        self.news_service_with(self.news.clone())
    }

    pub fn news_service_with(&self, news: Arc<dyn NewsRepository>) -> NewsService {
        NewsService::new(news, self.categories.clone(), self.identity.clone())
    }

    /// Insert a user directly, with password [`TEST_PASSWORD`]
    pub async fn seed_user(&self, username: &str, role: Role) -> User {
        let hash = hash_password(TEST_PASSWORD).expect("Failed to hash password");
        let user = User::new(
            username.to_string(),
            hash,
            format!("{} Name", username),
            role,
        );
        self.users.create(&user).await.expect("Failed to seed user")
    }

    pub async fn seed_category(&self, name: &str) -> Category {
        self.categories
            .create(&Category::new(name.to_string(), None))
            .await
            .expect("Failed to seed category")
    }

    pub async fn seed_news(&self, category_id: i64, title: &str, author: Option<&str>) -> News {
        let mut news = News::new(title.to_string(), "body".to_string(), category_id);
        news.author = author.map(str::to_string);
        self.news.create(&news).await.expect("Failed to seed news")
    }

    /// Context carrying a freshly issued token for `username`
    pub fn ctx_for(&self, username: &str) -> RequestContext {
        RequestContext::with_token(self.tokens.issue(username).expect("Failed to issue token"))
    }
}
