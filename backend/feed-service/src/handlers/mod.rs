//! HTTP handlers for the feed service

pub mod auth;
pub mod health;
pub mod posts;

pub use auth::{login, me, signup};
pub use health::health_check;
pub use posts::{add_comment, create_post, delete_comment, delete_post, get_post, list_posts, toggle_like};

use crate::error::AppError;

/// Fallback for every unmatched route or method
pub async fn route_not_found() -> Result<actix_web::HttpResponse, AppError> {
    Err(AppError::NotFoundRoute)
}
