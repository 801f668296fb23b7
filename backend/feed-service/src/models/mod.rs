//! Domain models for the feed service
mod ids;
mod post;
mod user;

pub use ids::{CommentId, PostId, UserId};
pub use post::{Comment, CommentView, Like, LikeAction, Post, PostView};
pub use user::{AuthorSummary, NewUser, User, UserProfile, UserSummary};
