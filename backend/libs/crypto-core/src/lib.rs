//! Shared cryptographic helpers for the feed backend
//!
//! - `jwt`: HS256 session token issuance and verification
//! - `password`: Argon2id password hashing
//! - `secret_validation`: strength checks for the token signing secret

pub mod jwt;
pub mod password;
pub mod secret_validation;

pub use jwt::{Claims, TokenError, TokenIssuer};
pub use password::{hash_password, verify_password, PasswordError};
pub use secret_validation::{validate_secret_strength, SecretStrength};
