//! Error types for Feed Service
//!
//! Every failure a handler, extractor or framework hook can produce ends up as an
//! [`AppError`], and every `AppError` renders through [`ErrorEnvelope`], so clients
//! always see `{ success: false, message, statusCode }`.

use actix_middleware::AuthHeaderError;
use actix_web::{
    error::{JsonPayloadError, PathError},
    http::StatusCode,
    HttpRequest, HttpResponse, ResponseError,
};
use crypto_core::{PasswordError, TokenError};
use once_cell::sync::OnceCell;
use serde::Serialize;
use thiserror::Error;

use crate::models::PostId;
use crate::services::uploads::UploadError;

/// Result type for feed-service operations
pub type Result<T> = std::result::Result<T, AppError>;

pub const NO_TOKEN_MESSAGE: &str = "Not authorized, no token provided";
const INTERNAL_MESSAGE: &str = "Internal Server Error";

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

static INCLUDE_ERROR_DETAIL: OnceCell<bool> = OnceCell::new();

/// Enable the `error` detail field on error envelopes. Only the first call takes effect.
pub fn set_include_error_detail(enabled: bool) {
    let _ = INCLUDE_ERROR_DETAIL.set(enabled);
}

fn include_error_detail() -> bool {
    INCLUDE_ERROR_DETAIL.get().copied().unwrap_or(false)
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing fields, invalid post, empty comment, bad request body
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    DuplicateIdentity(String),

    #[error("Invalid _id: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid token. Please log in again.")]
    TokenInvalid,

    #[error("Your token has expired. Please log in again.")]
    TokenExpired,

    /// Missing or malformed bearer header, bad login, account gone
    #[error("{0}")]
    Unauthenticated(String),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Route not found")]
    NotFoundRoute,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("concurrent updates kept conflicting on post {0}")]
    WriteConflict(PostId),

    #[error("database error: {0}")]
    Database(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Message shown to clients; internal failures are collapsed to a generic text
    pub fn public_message(&self) -> String {
        if self.status_code().is_server_error() {
            INTERNAL_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }

    /// Stable kind label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::DuplicateIdentity(_) => "duplicate_identity",
            AppError::InvalidIdentifier(_) => "invalid_identifier",
            AppError::TokenInvalid => "token_invalid",
            AppError::TokenExpired => "token_expired",
            AppError::Unauthenticated(_) => "unauthenticated",
            AppError::Upload(_) => "upload",
            AppError::NotFoundRoute => "route_not_found",
            AppError::NotFound(_) => "not_found",
            AppError::Forbidden(_) => "forbidden",
            AppError::WriteConflict(_) | AppError::Database(_) | AppError::Internal(_) => {
                "internal"
            }
        }
    }
}

/// Uniform JSON error body
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub success: bool,
    pub message: String,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorEnvelope {
    pub fn from_error(err: &AppError, include_detail: bool) -> Self {
        Self {
            success: false,
            message: err.public_message(),
            status_code: err.status_code().as_u16(),
            error: include_detail.then(|| format!("{:?}", err)),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::DuplicateIdentity(_)
            | AppError::InvalidIdentifier(_)
            | AppError::Upload(_) => StatusCode::BAD_REQUEST,
            AppError::TokenInvalid | AppError::TokenExpired | AppError::Unauthenticated(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::NotFoundRoute | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::WriteConflict(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(kind = self.kind(), status = status.as_u16(), error = %self, "Request rejected");
        }

        HttpResponse::build(status).json(ErrorEnvelope::from_error(self, include_error_detail()))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let message = match db_err.constraint() {
                    Some("users_email_key") => "Email already exists",
                    Some("users_username_key") => "Username already exists",
                    _ => "User with this email or username already exists",
                };
                return AppError::DuplicateIdentity(message.to_string());
            }
        }
        AppError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => AppError::TokenInvalid,
            TokenError::Expired => AppError::TokenExpired,
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<AuthHeaderError> for AppError {
    fn from(_: AuthHeaderError) -> Self {
        AppError::Unauthenticated(NO_TOKEN_MESSAGE.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Route JSON body failures into the uniform envelope
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = match &err {
        JsonPayloadError::ContentType => "Request body must be JSON".to_string(),
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            "Request body too large".to_string()
        }
        other => format!("Invalid request body: {}", other),
    };
    AppError::Validation(message).into()
}

/// Route path extraction failures into the uniform envelope
pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(err.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::Validation("x".into()), 400),
            (AppError::DuplicateIdentity("x".into()), 400),
            (AppError::InvalidIdentifier("abc".into()), 400),
            (AppError::TokenInvalid, 401),
            (AppError::TokenExpired, 401),
            (AppError::Unauthenticated("x".into()), 401),
            (AppError::Upload(UploadError::TooLarge { max_bytes: 5 }), 400),
            (AppError::NotFoundRoute, 404),
            (AppError::NotFound("x".into()), 404),
            (AppError::Forbidden("x".into()), 403),
            (AppError::WriteConflict(PostId::new()), 500),
            (AppError::Database("x".into()), 500),
            (AppError::Internal("x".into()), 500),
        ];

        for (err, status) in cases {
            assert_eq!(err.status_code().as_u16(), status, "{:?}", err);
        }
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err = AppError::Database("connection refused at 10.0.0.3".into());
        let envelope = ErrorEnvelope::from_error(&err, false);

        assert!(!envelope.success);
        assert_eq!(envelope.message, "Internal Server Error");
        assert_eq!(envelope.status_code, 500);
        assert!(envelope.error.is_none());

        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["statusCode"], 500);
    }

    #[test]
    fn test_detail_in_development() {
        let err = AppError::Database("connection refused".into());
        let envelope = ErrorEnvelope::from_error(&err, true);
        assert_eq!(envelope.message, "Internal Server Error");
        assert!(envelope.error.unwrap().contains("connection refused"));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            AppError::InvalidIdentifier("123".into()).public_message(),
            "Invalid _id: 123"
        );
        assert_eq!(
            AppError::from(TokenError::Expired).public_message(),
            "Your token has expired. Please log in again."
        );
        assert_eq!(
            AppError::from(TokenError::Invalid).public_message(),
            "Invalid token. Please log in again."
        );
        assert_eq!(
            AppError::from(AuthHeaderError::Malformed).public_message(),
            NO_TOKEN_MESSAGE
        );
        assert_eq!(
            AppError::Upload(UploadError::TooLarge { max_bytes: 5 * 1024 * 1024 }).public_message(),
            "File size too large. Maximum size is 5MB"
        );
    }

    #[actix_web::test]
    async fn test_error_response_body() {
        let resp = AppError::Forbidden("Not authorized to delete this post".into()).error_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Not authorized to delete this post");
        assert_eq!(json["statusCode"], 403);
    }
}
