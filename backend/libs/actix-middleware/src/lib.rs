//! # Actix Middleware Library
//!
//! Request plumbing shared by the feed backend's Actix services
//!
//! ## Modules
//! - `jwt_auth`: Bearer credential extraction from the `Authorization` header
//! - `correlation_id`: `x-correlation-id` propagation

pub mod correlation_id;
pub mod jwt_auth;

pub use correlation_id::{get_correlation_id, CorrelationId, CorrelationIdMiddleware};
pub use jwt_auth::{extract_bearer_token, AuthHeaderError};
