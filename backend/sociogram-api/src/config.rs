/// Configuration management for the Sociogram API
///
/// Everything is read from environment variables (after `.env` is loaded in
/// `main`). Production refuses to start with permissive CORS or a weak JWT
/// secret.
use std::str::FromStr;

use crypto_core::jwt::DEFAULT_TOKEN_TTL_HOURS;

pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;
const DEV_JWT_SECRET: &str = "sociogram-development-secret-change-me";

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub storage: StorageBackend,
    pub jwt: JwtConfig,
    /// Present only when both FCM variables are set
    pub fcm: Option<FcmConfig>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!(
                "STORAGE_BACKEND must be 'postgres' or 'memory', got '{}'",
                other
            )),
        }
    }
}

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_hours", &self.expiration_hours)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub project_id: String,
    pub service_account_path: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_env = lookup("APP_ENV").unwrap_or_else(|| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        Ok(Config {
            app: AppConfig {
                host: lookup("FEED_SERVICE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or_default(&lookup, "FEED_SERVICE_PORT", 5000)?,
                env: app_env,
            },
            cors: {
                let allowed_origins = match lookup("CORS_ALLOWED_ORIGINS") {
                    Some(value) => value,
                    None if production => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    None => "http://localhost:19006".to_string(),
                };

                if production && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL")
                    .unwrap_or_else(|| "postgresql://localhost/sociogram".to_string()),
                max_connections: parse_or_default(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            },
            storage: match lookup("STORAGE_BACKEND") {
                Some(value) => value.parse()?,
                None => StorageBackend::Postgres,
            },
            jwt: {
                let secret = match lookup("JWT_SECRET") {
                    Some(secret) => secret,
                    None if production => {
                        return Err("JWT_SECRET must be set in production".to_string())
                    }
                    None => DEV_JWT_SECRET.to_string(),
                };

                if production && secret.len() < MIN_PRODUCTION_SECRET_LEN {
                    return Err(format!(
                        "JWT_SECRET must be at least {} bytes in production",
                        MIN_PRODUCTION_SECRET_LEN
                    ));
                }

                let expiration_hours =
                    parse_or_default(&lookup, "JWT_EXPIRATION_HOURS", DEFAULT_TOKEN_TTL_HOURS)?;
                if expiration_hours <= 0 {
                    return Err("JWT_EXPIRATION_HOURS must be positive".to_string());
                }

                JwtConfig {
                    secret,
                    expiration_hours,
                }
            },
            fcm: match (lookup("FCM_PROJECT_ID"), lookup("FCM_SERVICE_ACCOUNT_PATH")) {
                (Some(project_id), Some(service_account_path)) => Some(FcmConfig {
                    project_id,
                    service_account_path,
                }),
                _ => None,
            },
        })
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, String>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        None => Ok(default),
    }
}
