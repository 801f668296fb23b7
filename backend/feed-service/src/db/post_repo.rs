use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use super::PostRepository;
use crate::error::Result;
use crate::models::{Comment, Like, Post, PostId, UserId};

const POST_COLUMNS: &str =
    "id, user_id, username, text, image, likes, comments, version, created_at, updated_at";

/// Row shape of the `posts` table; likes and comments are JSONB arrays
#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: PostId,
    user_id: UserId,
    username: String,
    text: Option<String>,
    image: Option<String>,
    likes: Json<Vec<Like>>,
    comments: Json<Vec<Comment>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            user: row.user_id,
            username: row.username,
            text: row.text,
            image: row.image,
            likes: row.likes.0,
            comments: row.comments.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        }
    }
}

#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn insert(&self, post: &Post) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, user_id, username, text, image, likes, comments, version,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(post.id)
        .bind(post.user)
        .bind(&post.username)
        .bind(&post.text)
        .bind(&post.image)
        .bind(Json(&post.likes))
        .bind(Json(&post.comments))
        .bind(post.version)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>> {
        let query = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);
        let row = sqlx::query_as::<_, PostRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Post::from))
    }

    async fn list_newest_first(&self) -> Result<Vec<Post>> {
        let query = format!(
            "SELECT {} FROM posts ORDER BY created_at DESC, id DESC",
            POST_COLUMNS
        );
        let rows = sqlx::query_as::<_, PostRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn save(&self, post: &Post) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET likes = $3, comments = $4, updated_at = $5, version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(post.id)
        .bind(post.version)
        .bind(Json(&post.likes))
        .bind(Json(&post.comments))
        .bind(post.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: PostId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
