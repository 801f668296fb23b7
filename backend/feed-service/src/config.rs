//! Configuration management for Feed Service
//!
//! Everything is read from environment variables (optionally seeded from a `.env`
//! file by the binary). Production refuses to start with unsafe settings.

use chrono::Duration;
use crypto_core::{jwt::parse_lifetime, validate_secret_strength, SecretStrength};
use db_pool::env_utils::{parse_env_optional, parse_env_with_default};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_JWT_EXPIRE: &str = "7d";

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub upload: UploadConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Unset means production; anything unrecognised is rejected
    fn parse(raw: Option<&str>) -> Result<Self, String> {
        let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(Environment::Production);
        };
        match raw.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!(
                "APP_ENV must be 'development' or 'production', got '{}'",
                other
            )),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Application settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub host: String,
    pub port: u16,
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins, or `*`
    pub allowed_origins: String,
}

/// Database configuration; `None` selects in-memory storage
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub lifetime: Duration,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("lifetime_secs", &self.lifetime.num_seconds())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let env = Environment::parse(std::env::var("APP_ENV").ok().as_deref())?;
        let production = env == Environment::Production;

        let app = AppConfig {
            env,
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env_with_default("PORT", DEFAULT_PORT),
        };

        let cors = {
            let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                Ok(value) if !value.trim().is_empty() => value,
                _ if production => {
                    return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                }
                _ => "*".to_string(),
            };

            if production && allowed_origins.trim() == "*" {
                return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
            }

            CorsConfig { allowed_origins }
        };

        let database = DatabaseConfig {
            url: parse_env_optional::<String>("DATABASE_URL"),
        };
        if production && database.url.is_none() {
            return Err("DATABASE_URL must be set in production".to_string());
        }

        let jwt = {
            let secret = std::env::var("JWT_SECRET")
                .ok()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| "JWT_SECRET must be set".to_string())?;

            if production && validate_secret_strength(&secret) == SecretStrength::Weak {
                return Err(
                    "JWT_SECRET is too weak for production (use at least 32 random characters)"
                        .to_string(),
                );
            }

            let raw_lifetime =
                std::env::var("JWT_EXPIRE").unwrap_or_else(|_| DEFAULT_JWT_EXPIRE.to_string());
            let lifetime = parse_lifetime(&raw_lifetime).map_err(|e| format!("JWT_EXPIRE: {}", e))?;

            JwtConfig { secret, lifetime }
        };

        let upload = UploadConfig {
            dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            max_bytes: parse_env_with_default("UPLOAD_MAX_BYTES", DEFAULT_UPLOAD_MAX_BYTES),
        };

        let log = LogConfig {
            format: match std::env::var("LOG_FORMAT") {
                Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        Ok(Config {
            app,
            cors,
            database,
            jwt,
            upload,
            log,
        })
    }

    /// Whether error envelopes carry debug detail
    pub fn expose_error_detail(&self) -> bool {
        self.app.env == Environment::Development
    }

    pub fn jwt_secret_is_weak(&self) -> bool {
        validate_secret_strength(&self.jwt.secret) == SecretStrength::Weak
    }
}
