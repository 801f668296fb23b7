//! Bearer credential extraction
//!
//! Services resolve the token themselves (signature, expiry, account lookup); this module
//! only enforces the `Authorization: Bearer <token>` shape so every service rejects missing
//! and malformed headers the same way.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use thiserror::Error;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthHeaderError {
    #[error("Missing Authorization header")]
    Missing,

    #[error("Invalid Authorization header format")]
    Malformed,
}

/// Return the token part of an `Authorization: Bearer <token>` header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthHeaderError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthHeaderError::Missing)?
        .to_str()
        .map_err(|_| AuthHeaderError::Malformed)?;

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .ok_or(AuthHeaderError::Malformed)?;

    if token.is_empty() || token.contains(' ') {
        return Err(AuthHeaderError::Malformed);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_valid_bearer() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(extract_bearer_token(&headers), Ok("abc.def.ghi"));
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(
            extract_bearer_token(&HeaderMap::new()),
            Err(AuthHeaderError::Missing)
        );
    }

    #[test]
    fn test_wrong_scheme() {
        let headers = headers_with("Basic dXNlcjpwYXNz");
        assert_eq!(extract_bearer_token(&headers), Err(AuthHeaderError::Malformed));
    }

    #[test]
    fn test_empty_token() {
        let headers = headers_with("Bearer ");
        assert_eq!(extract_bearer_token(&headers), Err(AuthHeaderError::Malformed));
    }

    #[test]
    fn test_scheme_without_separator() {
        let headers = headers_with("Bearerabc.def.ghi");
        assert_eq!(extract_bearer_token(&headers), Err(AuthHeaderError::Malformed));
    }
}
