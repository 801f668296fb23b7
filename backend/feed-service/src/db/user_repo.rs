use async_trait::async_trait;
use sqlx::PgPool;

use super::UserRepository;
use crate::error::Result;
use crate::models::{NewUser, User, UserId};

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, updated_at";

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let query = format!(
            "INSERT INTO users (id, username, email, password_hash) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );

        let created = sqlx::query_as::<_, User>(&query)
            .bind(UserId::new())
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw: Vec<uuid::Uuid> = ids.iter().map(UserId::as_uuid).collect();
        let query = format!("SELECT {} FROM users WHERE id = ANY($1)", USER_COLUMNS);
        let users = sqlx::query_as::<_, User>(&query)
            .bind(&raw)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> Result<Option<User>> {
        let query = format!(
            "SELECT {} FROM users WHERE email = $1 OR username = $2 LIMIT 1",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}
