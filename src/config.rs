use std::time::Duration;

use thiserror::Error;
use tracing::warn;

const DEV_JWT_SECRET: &str = "usergate-dev-secret-change-me";
/// One year.
pub const MAX_JWT_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
    pub acquire_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
}

impl ServerConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

/// Name and version reported by `/health` and `/version`.
#[derive(Debug, Clone)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub server: ServerConfig,
    pub app: AppInfo,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let server = ServerConfig {
            host: get_or("APP_HOST", "0.0.0.0"),
            port: parse_or(&get, "APP_PORT", 8080)?,
            environment: get_or("APP_ENV", "development"),
        };

        let database_url = match get("DATABASE_URL") {
            Some(url) => url,
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                get_or("DB_USER", "postgres"),
                get_or("DB_PASSWORD", ""),
                get_or("DB_HOST", "localhost"),
                get_or("DB_PORT", "5432"),
                get_or("DB_NAME", "usergate"),
            ),
        };
        let database = DatabaseConfig {
            url: database_url,
            max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 25)?,
            min_connections: parse_or(&get, "DB_MIN_CONNECTIONS", 5)?,
            max_lifetime: Duration::from_secs(parse_or(&get, "DB_MAX_LIFETIME_SECS", 300)?),
            acquire_timeout: Duration::from_secs(parse_or(&get, "DB_ACQUIRE_TIMEOUT_SECS", 5)?),
        };

        let secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None if server.is_production() => return Err(ConfigError::Missing("JWT_SECRET")),
            None => {
                warn!("JWT_SECRET not set; using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };
        let jwt = JwtConfig {
            secret,
            issuer: get_or("JWT_ISSUER", "usergate"),
            audience: get_or("JWT_AUDIENCE", "usergate-users"),
            ttl_minutes: parse_or(&get, "JWT_TTL_MINUTES", 60 * 24)?,
        };
        if !(0..=MAX_JWT_TTL_MINUTES).contains(&jwt.ttl_minutes) {
            return Err(ConfigError::Invalid {
                key: "JWT_TTL_MINUTES",
                value: jwt.ttl_minutes.to_string(),
            });
        }

        let app = AppInfo {
            name: get_or("APP_NAME", "usergate"),
            version: get_or("APP_VERSION", env!("CARGO_PKG_VERSION")),
            description: get_or(
                "APP_DESCRIPTION",
                "User registration, login and role-gated user administration API",
            ),
        };

        Ok(Self {
            database,
            jwt,
            server,
            app,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}
