//! Persistence for users and post aggregates
//!
//! Services talk to storage only through [`UserRepository`] and [`PostRepository`].
//! PostgreSQL backs production; the in-memory implementation backs tests and
//! local runs without `DATABASE_URL`.

pub mod memory;
pub mod post_repo;
pub mod user_repo;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::Result;
use crate::models::{NewUser, Post, PostId, User, UserId};

pub use memory::{InMemoryPostRepository, InMemoryUserRepository};
pub use post_repo::PgPostRepository;
pub use user_repo::PgUserRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new account. Unique violations surface as `AppError::DuplicateIdentity`.
    async fn insert(&self, user: NewUser) -> Result<User>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>>;

    async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Any account already holding `email` or `username`
    async fn find_by_email_or_username(&self, email: &str, username: &str)
        -> Result<Option<User>>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert(&self, post: &Post) -> Result<()>;

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>>;

    /// Every post, newest first
    async fn list_newest_first(&self) -> Result<Vec<Post>>;

    /// Save the whole aggregate if its stored version still equals `post.version`.
    /// Returns `false` when another writer got there first.
    async fn save(&self, post: &Post) -> Result<bool>;

    /// Returns `false` when no such post existed
    async fn delete(&self, id: PostId) -> Result<bool>;
}

/// Apply embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Cheap round trip used by the health endpoint
pub async fn ping(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
