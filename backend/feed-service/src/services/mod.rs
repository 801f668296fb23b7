//! Service layer for the feed service

pub mod auth;
pub mod credentials;
pub mod posts;
pub mod uploads;

pub use auth::{AuthService, AuthSession};
pub use credentials::CredentialStore;
pub use posts::PostService;
pub use uploads::{PostForm, UploadError, UploadStore};
