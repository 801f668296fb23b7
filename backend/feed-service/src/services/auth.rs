//! Signup, login and session resolution
use crypto_core::TokenIssuer;
use tracing::info;

use super::CredentialStore;
use crate::error::{AppError, Result};
use crate::models::{User, UserId};

/// An account together with a freshly issued session token
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

#[derive(Clone)]
pub struct AuthService {
    credentials: CredentialStore,
    tokens: TokenIssuer,
}

/// Column widths of `users.username` and `users.email`
pub const MAX_USERNAME_CHARS: usize = 50;
pub const MAX_EMAIL_CHARS: usize = 255;

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl AuthService {
    pub fn new(credentials: CredentialStore, tokens: TokenIssuer) -> Self {
        Self {
            credentials,
            tokens,
        }
    }

    pub async fn signup(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<AuthSession> {
        let (Some(username), Some(email), Some(password)) = (
            non_blank(username),
            non_blank(email),
            password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AppError::Validation(
                "Please provide all required fields".to_string(),
            ));
        };
        let email = email.to_lowercase();

        if username.chars().count() > MAX_USERNAME_CHARS {
            return Err(AppError::Validation(format!(
                "Username must be at most {} characters",
                MAX_USERNAME_CHARS
            )));
        }
        if email.chars().count() > MAX_EMAIL_CHARS {
            return Err(AppError::Validation(format!(
                "Email must be at most {} characters",
                MAX_EMAIL_CHARS
            )));
        }

        let existing = self
            .credentials
            .find_by_email_or_username(&email, username)
            .await?;
        if existing.is_some() {
            return Err(AppError::DuplicateIdentity(
                "User with this email or username already exists".to_string(),
            ));
        }

        let user = self.credentials.create(username, &email, password).await?;
        let token = self.tokens.issue(user.id.as_uuid())?;

        info!(user_id = %user.id, username = %user.username, "User signed up");
        Ok(AuthSession { user, token })
    }

    pub async fn login(&self, email: Option<&str>, password: Option<&str>) -> Result<AuthSession> {
        let (Some(email), Some(password)) = (non_blank(email), password.filter(|p| !p.is_empty()))
        else {
            return Err(AppError::Validation(
                "Please provide email and password".to_string(),
            ));
        };

        let invalid = || AppError::Unauthenticated("Invalid credentials".to_string());

        let user = self
            .credentials
            .find_by_email(email)
            .await?
            .ok_or_else(invalid)?;

        if !self.credentials.verify_password(&user, password)? {
            return Err(invalid());
        }

        let token = self.tokens.issue(user.id.as_uuid())?;
        info!(user_id = %user.id, "User logged in");
        Ok(AuthSession { user, token })
    }

    /// Current account for `/api/auth/me`
    pub async fn me(&self, user_id: UserId) -> Result<User> {
        self.credentials
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Resolve the account a bearer token was issued for
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let user_id = UserId::from(self.tokens.verify(token)?);
        self.credentials
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("User not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryUserRepository;
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    const SECRET: &str = "auth-service-test-secret-with-enough-length";

    fn service() -> AuthService {
        AuthService::new(
            CredentialStore::new(Arc::new(InMemoryUserRepository::new())),
            TokenIssuer::new(SECRET, Duration::days(7)),
        )
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let auth = service();
        let session = auth
            .signup(Some("alice"), Some("Alice@Example.com"), Some("secret1"))
            .await
            .unwrap();
        assert_eq!(session.user.email, "alice@example.com");
        assert_eq!(auth.tokens.verify(&session.token), Ok(session.user.id.as_uuid()));

        let login = auth.login(Some("alice@example.com"), Some("secret1")).await.unwrap();
        assert_eq!(login.user.id, session.user.id);

        let err = auth.login(Some("alice"), Some("secret1")).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[tokio::test]
    async fn test_login_when_email_matches_older_username() {
        let auth = service();
        auth.signup(Some("bob@example.com"), Some("a@example.com"), Some("passA"))
            .await
            .unwrap();
        let bob = auth
            .signup(Some("bob"), Some("bob@example.com"), Some("passB"))
            .await
            .unwrap();

        let login = auth.login(Some("bob@example.com"), Some("passB")).await.unwrap();
        assert_eq!(login.user.id, bob.user.id);
    }

    #[tokio::test]
    async fn test_signup_requires_all_fields() {
        let auth = service();
        let err = auth.signup(Some("alice"), None, Some("pw")).await.unwrap_err();
        assert_eq!(err.to_string(), "Please provide all required fields");

        let err = auth.signup(Some("  "), Some("a@b.c"), Some("pw")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_signup_rejects_oversized_handles() {
        let auth = service();

        let longest = "a".repeat(MAX_USERNAME_CHARS);
        auth.signup(Some(&longest), Some("a@example.com"), Some("pw"))
            .await
            .unwrap();

        let err = auth
            .signup(Some(&"b".repeat(MAX_USERNAME_CHARS + 1)), Some("b@example.com"), Some("pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.to_string(), "Username must be at most 50 characters");

        let email = format!("{}@example.com", "c".repeat(MAX_EMAIL_CHARS));
        let err = auth.signup(Some("carol"), Some(&email), Some("pw")).await.unwrap_err();
        assert_eq!(err.to_string(), "Email must be at most 255 characters");
    }

    #[tokio::test]
    async fn test_duplicate_signup() {
        let auth = service();
        auth.signup(Some("alice"), Some("alice@example.com"), Some("secret1"))
            .await
            .unwrap();

        let err = auth
            .signup(Some("alice"), Some("other@example.com"), Some("secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateIdentity(_)));
        assert_eq!(
            err.to_string(),
            "User with this email or username already exists"
        );
    }

    #[tokio::test]
    async fn test_bad_login() {
        let auth = service();
        auth.signup(Some("alice"), Some("alice@example.com"), Some("secret1"))
            .await
            .unwrap();

        let err = auth.login(Some("alice@example.com"), Some("nope")).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");

        let err = auth.login(Some("ghost@example.com"), Some("secret1")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));

        let err = auth.login(None, Some("secret1")).await.unwrap_err();
        assert_eq!(err.to_string(), "Please provide email and password");
    }

    #[tokio::test]
    async fn test_authenticate() {
        let auth = service();
        let session = auth
            .signup(Some("alice"), Some("alice@example.com"), Some("secret1"))
            .await
            .unwrap();

        let user = auth.authenticate(&session.token).await.unwrap();
        assert_eq!(user.id, session.user.id);

        let expired = auth
            .tokens
            .issue_at(session.user.id.as_uuid(), Utc::now() - Duration::days(8))
            .unwrap();
        assert!(matches!(auth.authenticate(&expired).await, Err(AppError::TokenExpired)));
        assert!(matches!(auth.authenticate("garbage").await, Err(AppError::TokenInvalid)));

        let orphan = auth.tokens.issue(uuid::Uuid::new_v4()).unwrap();
        let err = auth.authenticate(&orphan).await.unwrap_err();
        assert_eq!(err.to_string(), "User not found");
    }
}
