//! Post aggregate operations
//!
//! Every mutation of an existing post is a read-modify-write of the whole aggregate
//! guarded by its version. A lost race reloads the post and applies the change again,
//! up to [`MAX_WRITE_ATTEMPTS`] times.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::uploads::UploadStore;
use super::CredentialStore;
use crate::db::PostRepository;
use crate::error::{AppError, Result};
use crate::middleware::permissions::{check_comment_authorship, check_post_ownership};
use crate::models::{CommentId, LikeAction, Post, PostId, PostView, UserId, UserSummary};

pub const MAX_WRITE_ATTEMPTS: usize = 3;

/// Parse a post id taken from a request path
pub fn parse_post_id(raw: &str) -> Result<PostId> {
    raw.parse()
        .map_err(|_| AppError::InvalidIdentifier(raw.to_string()))
}

/// Parse a comment id taken from a request path
pub fn parse_comment_id(raw: &str) -> Result<CommentId> {
    raw.parse()
        .map_err(|_| AppError::InvalidIdentifier(raw.to_string()))
}

fn post_not_found() -> AppError {
    AppError::NotFound("Post not found".to_string())
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    credentials: CredentialStore,
    uploads: UploadStore,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        credentials: CredentialStore,
        uploads: UploadStore,
    ) -> Self {
        Self {
            posts,
            credentials,
            uploads,
        }
    }

    /// Create a post owned by `owner`. A stored image is removed again if the post is rejected.
    pub async fn create(
        &self,
        owner: &UserSummary,
        text: Option<String>,
        image: Option<String>,
    ) -> Result<PostView> {
        let result = self.insert_new(owner, text, image.clone()).await;

        if result.is_err() {
            if let Some(path) = image.as_deref() {
                self.uploads.discard(path).await;
            }
        }
        result
    }

    async fn insert_new(
        &self,
        owner: &UserSummary,
        text: Option<String>,
        image: Option<String>,
    ) -> Result<PostView> {
        let post = Post::new(owner.id, &owner.username, text, image, Utc::now()).ok_or_else(
            || AppError::Validation("Post must contain either text or image".to_string()),
        )?;

        self.posts.insert(&post).await?;
        info!(post_id = %post.id, user_id = %owner.id, "Post created");

        self.render_one(post).await
    }

    /// Whole feed, newest first
    pub async fn list_all(&self) -> Result<Vec<PostView>> {
        let posts = self.posts.list_newest_first().await?;
        self.render(posts).await
    }

    pub async fn get_by_id(&self, raw_id: &str) -> Result<PostView> {
        let post = self.load(parse_post_id(raw_id)?).await?;
        self.render_one(post).await
    }

    pub async fn delete(&self, raw_id: &str, caller: UserId) -> Result<()> {
        let post_id = parse_post_id(raw_id)?;
        let post = self.load(post_id).await?;
        check_post_ownership(caller, &post)?;

        if !self.posts.delete(post_id).await? {
            return Err(post_not_found());
        }
        if let Some(image) = post.image.as_deref() {
            self.uploads.discard(image).await;
        }

        info!(post_id = %post_id, user_id = %caller, "Post deleted");
        Ok(())
    }

    /// Like the post, or remove the caller's like if it is already there
    pub async fn toggle_like(
        &self,
        raw_id: &str,
        caller: &UserSummary,
    ) -> Result<(PostView, LikeAction)> {
        let post_id = parse_post_id(raw_id)?;
        let (post, action) = self
            .mutate(post_id, |post| {
                Ok(post.toggle_like(caller.id, &caller.username, Utc::now()))
            })
            .await?;

        debug!(post_id = %post_id, user_id = %caller.id, ?action, "Like toggled");
        Ok((self.render_one(post).await?, action))
    }

    pub async fn add_comment(
        &self,
        raw_id: &str,
        caller: &UserSummary,
        text: Option<&str>,
    ) -> Result<PostView> {
        let text = text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Comment text is required".to_string()))?;
        let post_id = parse_post_id(raw_id)?;

        let (post, comment_id) = self
            .mutate(post_id, |post| {
                Ok(post.add_comment(caller.id, &caller.username, text, Utc::now()))
            })
            .await?;

        debug!(post_id = %post_id, comment_id = %comment_id, "Comment added");
        self.render_one(post).await
    }

    pub async fn delete_comment(
        &self,
        raw_post_id: &str,
        raw_comment_id: &str,
        caller: UserId,
    ) -> Result<PostView> {
        let post_id = parse_post_id(raw_post_id)?;
        let comment_id = parse_comment_id(raw_comment_id)?;

        let (post, _) = self
            .mutate(post_id, |post| {
                let comment = post
                    .find_comment(comment_id)
                    .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
                check_comment_authorship(caller, comment)?;
                post.remove_comment(comment_id, Utc::now());
                Ok(())
            })
            .await?;

        debug!(post_id = %post_id, comment_id = %comment_id, "Comment deleted");
        self.render_one(post).await
    }

    async fn load(&self, post_id: PostId) -> Result<Post> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(post_not_found)
    }

    /// Load, apply and save with a version check, retrying on lost races
    async fn mutate<T, F>(&self, post_id: PostId, mut apply: F) -> Result<(Post, T)>
    where
        F: FnMut(&mut Post) -> Result<T> + Send,
        T: Send,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut post = self.load(post_id).await?;
            let outcome = apply(&mut post)?;

            if self.posts.save(&post).await? {
                post.version += 1;
                return Ok((post, outcome));
            }
            debug!(post_id = %post_id, attempt, "Post changed concurrently, retrying");
        }

        warn!(post_id = %post_id, attempts = MAX_WRITE_ATTEMPTS, "Giving up on post update");
        Err(AppError::WriteConflict(post_id))
    }

    async fn render_one(&self, post: Post) -> Result<PostView> {
        let mut views = self.render(vec![post]).await?;
        views.pop().ok_or_else(post_not_found)
    }

    async fn render(&self, posts: Vec<Post>) -> Result<Vec<PostView>> {
        let ids: Vec<UserId> = posts.iter().flat_map(Post::referenced_users).collect();
        let users = self.credentials.find_by_ids(&ids).await?;
        Ok(posts
            .into_iter()
            .map(|post| PostView::render(post, &users))
            .collect())
    }
}
