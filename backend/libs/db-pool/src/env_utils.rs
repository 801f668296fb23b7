//! Environment variable parsing helpers shared by pool and service configuration

use std::str::FromStr;

/// Parse an environment variable, falling back to `default` when missing or unparsable
pub fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    parse_env_optional(key).unwrap_or(default)
}

/// Parse an environment variable; `None` when missing, empty or unparsable
pub fn parse_env_optional<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn test_parse_with_default() {
        std::env::remove_var("DB_POOL_TEST_VALUE");
        assert_eq!(parse_env_with_default("DB_POOL_TEST_VALUE", 7u32), 7);

        std::env::set_var("DB_POOL_TEST_VALUE", "12");
        assert_eq!(parse_env_with_default("DB_POOL_TEST_VALUE", 7u32), 12);

        std::env::set_var("DB_POOL_TEST_VALUE", "not-a-number");
        assert_eq!(parse_env_with_default("DB_POOL_TEST_VALUE", 7u32), 7);

        std::env::remove_var("DB_POOL_TEST_VALUE");
    }

    #[test]
    #[serial_test::serial]
    fn test_parse_optional_treats_blank_as_missing() {
        std::env::set_var("DB_POOL_TEST_OPTIONAL", "  ");
        assert_eq!(parse_env_optional::<String>("DB_POOL_TEST_OPTIONAL"), None);

        std::env::set_var("DB_POOL_TEST_OPTIONAL", " postgres://db/feed ");
        assert_eq!(
            parse_env_optional::<String>("DB_POOL_TEST_OPTIONAL").as_deref(),
            Some("postgres://db/feed")
        );
        std::env::remove_var("DB_POOL_TEST_OPTIONAL");
    }
}
