//! Feed service: accounts, session tokens and a feed of posts with likes and comments.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use actix_web::{web, Resource};
use crypto_core::TokenIssuer;
use sqlx::PgPool;
use std::sync::Arc;

pub use config::Config;
pub use error::{AppError, Result};

use db::{
    InMemoryPostRepository, InMemoryUserRepository, PgPostRepository, PgUserRepository,
    PostRepository, UserRepository,
};
use handlers::health::HealthState;
use services::{AuthService, CredentialStore, PostService, UploadStore};

/// Shared state handed to every worker
#[derive(Clone)]
pub struct AppState {
    pub auth: web::Data<AuthService>,
    pub posts: web::Data<PostService>,
    pub uploads: web::Data<UploadStore>,
    pub health: web::Data<HealthState>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        tokens: TokenIssuer,
        uploads: UploadStore,
        pool: Option<PgPool>,
    ) -> Self {
        let credentials = CredentialStore::new(users);
        let post_service = PostService::new(posts, credentials.clone(), uploads.clone());

        Self {
            auth: web::Data::new(AuthService::new(credentials, tokens)),
            posts: web::Data::new(post_service),
            uploads: web::Data::new(uploads),
            health: web::Data::new(HealthState { pool }),
        }
    }

    /// State backed by PostgreSQL
    pub fn postgres(pool: PgPool, tokens: TokenIssuer, uploads: UploadStore) -> Self {
        Self::new(
            Arc::new(PgUserRepository::new(pool.clone())),
            Arc::new(PgPostRepository::new(pool.clone())),
            tokens,
            uploads,
            Some(pool),
        )
    }

    /// State backed by in-memory repositories
    pub fn in_memory(tokens: TokenIssuer, uploads: UploadStore) -> Self {
        Self::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryPostRepository::new()),
            tokens,
            uploads,
            None,
        )
    }
}

fn resource(path: &str) -> Resource {
    web::resource(path).default_service(web::to(handlers::route_not_found))
}

/// Register state, extractor error handlers and every route
pub fn configure_app(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(state.auth.clone())
        .app_data(state.posts.clone())
        .app_data(state.uploads.clone())
        .app_data(state.health.clone())
        .app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::PathConfig::default().error_handler(error::path_error_handler))
        .service(resource("/api/health").route(web::get().to(handlers::health_check)))
        .service(
            web::scope("/api/auth")
                .service(resource("/signup").route(web::post().to(handlers::signup)))
                .service(resource("/login").route(web::post().to(handlers::login)))
                .service(resource("/me").route(web::get().to(handlers::me))),
        )
        .service(
            web::scope("/api/posts")
                .service(
                    resource("")
                        .route(web::get().to(handlers::list_posts))
                        .route(web::post().to(handlers::create_post)),
                )
                .service(
                    resource("/{id}")
                        .route(web::get().to(handlers::get_post))
                        .route(web::delete().to(handlers::delete_post)),
                )
                .service(resource("/{id}/like").route(web::put().to(handlers::toggle_like)))
                .service(resource("/{id}/comment").route(web::post().to(handlers::add_comment)))
                .service(
                    resource("/{id}/comment/{comment_id}")
                        .route(web::delete().to(handlers::delete_comment)),
                ),
        )
        .default_service(web::to(handlers::route_not_found));
}
