//! Session token issuance and verification
//!
//! Tokens are HS256-signed JWTs carrying `{ id, iat, exp }`. The signing secret is handed
//! to [`TokenIssuer::new`] at start-up and kept inside the issuer; there is no global key
//! state. Changing the secret invalidates every token signed with the previous one, there is
//! no key rollover.
//!
//! ## Usage
//!
//! ```rust
//! use chrono::Duration;
//! use crypto_core::jwt::TokenIssuer;
//! use uuid::Uuid;
//!
//! let issuer = TokenIssuer::new("a-long-random-signing-secret-value", Duration::days(7));
//! let user_id = Uuid::new_v4();
//! let token = issuer.issue(user_id).unwrap();
//! assert_eq!(issuer.verify(&token).unwrap(), user_id);
//! ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims carried by a session token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// User ID (UUID string)
    pub id: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Signature mismatch, malformed token or malformed claims
    #[error("invalid token")]
    Invalid,

    #[error("token expired")]
    Expired,

    #[error("failed to encode token: {0}")]
    Encoding(String),

    #[error("invalid token lifetime: {0}")]
    InvalidLifetime(String),
}

/// Mints and verifies session tokens with a single process-wide secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &"[REDACTED]")
            .field("lifetime_secs", &self.lifetime.num_seconds())
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }

    /// Issue a token for `user_id` valid for the configured lifetime from now
    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issue a token as if it had been minted at `issued_at`
    pub fn issue_at(&self, user_id: Uuid, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            id: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.lifetime).timestamp(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify signature and expiry, returning the decoded claims
    pub fn decode_claims(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }

    /// Verify a token and return the user identity it was issued for
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let claims = self.decode_claims(token)?;
        Uuid::parse_str(&claims.id).map_err(|_| TokenError::Invalid)
    }
}

/// Parse a token lifetime such as `7d`, `12h`, `30m`, `45s` or a bare number of seconds
pub fn parse_lifetime(raw: &str) -> Result<Duration, TokenError> {
    let raw = raw.trim();
    let invalid = || TokenError::InvalidLifetime(raw.to_string());

    let (digits, unit) = match raw.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&raw[..idx], Some(c.to_ascii_lowercase())),
        Some(_) => (raw, None),
        None => return Err(invalid()),
    };

    let amount: i64 = digits.trim().parse().map_err(|_| invalid())?;
    if amount <= 0 {
        return Err(invalid());
    }

    match unit {
        None | Some('s') => Ok(Duration::seconds(amount)),
        Some('m') => Ok(Duration::minutes(amount)),
        Some('h') => Ok(Duration::hours(amount)),
        Some('d') => Ok(Duration::days(amount)),
        Some(_) => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-signing-secret-with-enough-length";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET, Duration::hours(1))
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer();
        let user_id = Uuid::new_v4();

        let token = issuer.issue(user_id).expect("issue token");
        assert_eq!(token.matches('.').count(), 2);
        assert_eq!(issuer.verify(&token), Ok(user_id));
    }

    #[test]
    fn test_claims_carry_lifetime() {
        let issuer = issuer();
        let token = issuer.issue(Uuid::new_v4()).unwrap();
        let claims = issuer.decode_claims(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token() {
        let issuer = issuer();
        let token = issuer
            .issue_at(Uuid::new_v4(), Utc::now() - Duration::hours(2))
            .unwrap();
        assert_eq!(issuer.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = issuer().issue(Uuid::new_v4()).unwrap();
        let other = TokenIssuer::new("a-completely-different-signing-secret", Duration::hours(1));
        assert_eq!(other.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert_eq!(issuer().verify("invalid.token.here"), Err(TokenError::Invalid));
        assert_eq!(issuer().verify(""), Err(TokenError::Invalid));
    }

    #[test]
    fn test_non_uuid_subject_is_invalid() {
        let now = Utc::now();
        let claims = Claims {
            id: "not-a-uuid".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(JWT_ALGORITHM),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(issuer().verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_parse_lifetime() {
        assert_eq!(parse_lifetime("7d"), Ok(Duration::days(7)));
        assert_eq!(parse_lifetime("12h"), Ok(Duration::hours(12)));
        assert_eq!(parse_lifetime("30m"), Ok(Duration::minutes(30)));
        assert_eq!(parse_lifetime("45s"), Ok(Duration::seconds(45)));
        assert_eq!(parse_lifetime("3600"), Ok(Duration::seconds(3600)));
        assert!(parse_lifetime("").is_err());
        assert!(parse_lifetime("0d").is_err());
        assert!(parse_lifetime("5y").is_err());
        assert!(parse_lifetime("d").is_err());
    }
}
