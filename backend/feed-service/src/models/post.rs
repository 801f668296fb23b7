//! Post aggregate
//!
//! A post owns two ordered sequences, likes and comments, that are always
//! loaded and saved together with the post row. `version` guards concurrent
//! read-modify-write cycles and never leaves the service.

use super::{AuthorSummary, CommentId, PostId, User, UserId, UserSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Like {
    pub user: UserId,
    pub username: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: CommentId,
    pub user: UserId,
    pub username: String,
    pub text: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeAction {
    Liked,
    Unliked,
}

impl LikeAction {
    pub fn message(&self) -> &'static str {
        match self {
            LikeAction::Liked => "Post liked",
            LikeAction::Unliked => "Post unliked",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: PostId,
    pub user: UserId,
    pub username: String,
    pub text: Option<String>,
    pub image: Option<String>,
    pub likes: Vec<Like>,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

/// Treat whitespace-only text as absent
fn normalize_text(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

impl Post {
    /// Build a new post; `None` when it would carry neither text nor image
    pub fn new(
        owner: UserId,
        username: &str,
        text: Option<String>,
        image: Option<String>,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let text = normalize_text(text);
        if text.is_none() && image.is_none() {
            return None;
        }

        Some(Self {
            id: PostId::new(),
            user: owner,
            username: username.to_string(),
            text,
            image,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.user == user
    }

    pub fn is_liked_by(&self, user: UserId) -> bool {
        self.likes.iter().any(|like| like.user == user)
    }

    /// Remove the caller's like if present, otherwise append one
    pub fn toggle_like(&mut self, user: UserId, username: &str, now: DateTime<Utc>) -> LikeAction {
        let action = if self.is_liked_by(user) {
            self.likes.retain(|like| like.user != user);
            LikeAction::Unliked
        } else {
            self.likes.push(Like {
                user,
                username: username.to_string(),
                created_at: now,
            });
            LikeAction::Liked
        };

        self.updated_at = now;
        action
    }

    pub fn add_comment(
        &mut self,
        user: UserId,
        username: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> CommentId {
        let id = CommentId::new();
        self.comments.push(Comment {
            id,
            user,
            username: username.to_string(),
            text: text.to_string(),
            created_at: now,
        });
        self.updated_at = now;
        id
    }

    pub fn find_comment(&self, id: CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    /// Remove a comment by identifier, returning it if it existed
    pub fn remove_comment(&mut self, id: CommentId, now: DateTime<Utc>) -> Option<Comment> {
        let idx = self.comments.iter().position(|c| c.id == id)?;
        self.updated_at = now;
        Some(self.comments.remove(idx))
    }

    /// Every user referenced by the post: owner first, then comment authors
    pub fn referenced_users(&self) -> impl Iterator<Item = UserId> + '_ {
        std::iter::once(self.user).chain(self.comments.iter().map(|c| c.user))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CommentView {
    #[serde(rename = "_id")]
    pub id: CommentId,
    pub user: Option<AuthorSummary>,
    pub username: String,
    pub text: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Post as returned by the HTTP surface, with owner and comment authors expanded.
/// Missing text or image is rendered as an empty string.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(rename = "_id")]
    pub id: PostId,
    pub user: Option<UserSummary>,
    pub username: String,
    pub text: String,
    pub image: String,
    pub likes: Vec<Like>,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostView {
    /// Render a post, expanding users found in `users`. Users that no longer exist become `null`.
    pub fn render(post: Post, users: &HashMap<UserId, User>) -> Self {
        let comments = post
            .comments
            .into_iter()
            .map(|c| CommentView {
                id: c.id,
                user: users.get(&c.user).map(AuthorSummary::from),
                username: c.username,
                text: c.text,
                created_at: c.created_at,
            })
            .collect();

        Self {
            id: post.id,
            user: users.get(&post.user).map(UserSummary::from),
            username: post.username,
            text: post.text.unwrap_or_default(),
            image: post.image.unwrap_or_default(),
            likes: post.likes,
            comments,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}
