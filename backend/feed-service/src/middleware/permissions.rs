//! Ownership checks for post and comment mutations
//!
//! Identities are compared as typed values; only the owner of a post may delete it
//! and only the author of a comment may remove it.

use crate::error::{AppError, Result};
use crate::models::{Comment, Post, UserId};

/// Check if a user owns a post
pub fn check_post_ownership(user_id: UserId, post: &Post) -> Result<()> {
    if post.is_owned_by(user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Not authorized to delete this post".to_string(),
        ))
    }
}

/// Check if a user wrote a comment
pub fn check_comment_authorship(user_id: UserId, comment: &Comment) -> Result<()> {
    if comment.user == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Not authorized to delete this comment".to_string(),
        ))
    }
}
