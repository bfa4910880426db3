//! Configuration management
//!
//! Everything is read once at startup and passed around as an immutable
//! `Config`. Nothing below the constructor touches the process environment.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::error::AppError;

/// Only used in development when `JWT_SECRET` is not set.
const DEVELOPMENT_JWT_SECRET: &str = "fsri_development_jwt_secret_change_me";

/// Token lifetime bounds, one hour to one year.
const JWT_EXPIRATION_HOURS_RANGE: std::ops::RangeInclusive<i64> = 1..=8760;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Unknown names are treated as production so that a typo never
    /// enables the permissive development behavior.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            _ => Environment::Production,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Raw name as configured, reported by the health endpoint.
    pub environment_name: String,
    pub environment: Environment,
    pub port: u16,
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub max_lifetime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Exact-match origins admitted in production, in configuration order.
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment_name = get("APP_ENV")
            .or_else(|| get("NODE_ENV"))
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| "development".to_string());
        let environment = Environment::from_name(&environment_name);

        let database_url = get("DATABASE_URL")
            .ok_or_else(|| AppError::configuration("DATABASE_URL is not set"))?;

        let default_max_connections = if environment.is_production() { 25 } else { 10 };

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None if environment.is_production() => {
                return Err(AppError::configuration(
                    "JWT_SECRET must be set in production",
                ));
            }
            None => {
                tracing::warn!("⚠️ JWT_SECRET not set, using the development secret");
                DEVELOPMENT_JWT_SECRET.to_string()
            }
        };

        let jwt_expiration_hours = parse_var(&get, "JWT_EXPIRATION_HOURS", 24)?;
        if !JWT_EXPIRATION_HOURS_RANGE.contains(&jwt_expiration_hours) {
            return Err(AppError::configuration(format!(
                "JWT_EXPIRATION_HOURS must be between {} and {}, got {}",
                JWT_EXPIRATION_HOURS_RANGE.start(),
                JWT_EXPIRATION_HOURS_RANGE.end(),
                jwt_expiration_hours
            )));
        }

        Ok(Config {
            app: AppConfig {
                environment_name,
                environment,
                port: parse_var(&get, "PORT", 3000)?,
                body_limit_bytes: parse_var(&get, "BODY_LIMIT_BYTES", 100 * 1024)?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_var(&get, "DATABASE_MAX_CONNECTIONS", default_max_connections)?,
                min_connections: parse_var(&get, "DATABASE_MIN_CONNECTIONS", 2)?,
                acquire_timeout_seconds: parse_var(&get, "DATABASE_ACQUIRE_TIMEOUT_SECONDS", 5)?,
                idle_timeout_seconds: parse_var(&get, "DATABASE_IDLE_TIMEOUT_SECONDS", 300)?,
                max_lifetime_seconds: parse_var(&get, "DATABASE_MAX_LIFETIME_SECONDS", 1800)?,
            },
            auth: AuthConfig {
                jwt_secret,
                jwt_expiration_hours,
            },
            cors: CorsConfig {
                allowed_origins: get("CORS_ALLOWED_ORIGINS")
                    .map(|raw| parse_origin_list(&raw))
                    .unwrap_or_default(),
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.environment.is_production()
    }

    pub fn is_development(&self) -> bool {
        self.app.environment.is_development()
    }
}

/// Splits a comma-separated origin list, trimming entries and dropping blanks.
pub fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_var<T, G>(get: &G, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| {
            AppError::configuration(format!("{} has an invalid value '{}': {}", key, raw, e))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_to_development() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/fsri")]).unwrap();
        assert_eq!(config.app.environment, Environment::Development);
        assert_eq!(config.app.environment_name, "development");
        assert_eq!(config.app.port, 3000);
        assert!(config.cors.allowed_origins.is_empty());
        assert_eq!(config.auth.jwt_secret, DEVELOPMENT_JWT_SECRET);
    }

    #[test]
    fn test_missing_database_url_is_a_configuration_error() {
        let err = config_from(&[("APP_ENV", "development")]).unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
    }

    #[test]
    fn test_node_env_is_used_when_app_env_is_absent() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/fsri"),
            ("NODE_ENV", "production"),
            ("JWT_SECRET", "s3cret"),
        ])
        .unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_production_requires_jwt_secret() {
        let err = config_from(&[
            ("DATABASE_URL", "postgres://localhost/fsri"),
            ("APP_ENV", "production"),
        ])
        .unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
    }

    #[test]
    fn test_unknown_environment_name_is_strict() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/fsri"),
            ("APP_ENV", "staging"),
            ("JWT_SECRET", "s3cret"),
        ])
        .unwrap();
        assert_eq!(config.app.environment, Environment::Production);
        assert_eq!(config.app.environment_name, "staging");
    }

    #[test]
    fn test_allowed_origins_are_trimmed() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/fsri"),
            ("CORS_ALLOWED_ORIGINS", " https://app.example.com , ,https://admin.example.com"),
        ])
        .unwrap();
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://app.example.com", "https://admin.example.com"]
        );
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = config_from(&[
            ("DATABASE_URL", "postgres://localhost/fsri"),
            ("PORT", "eighty"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_jwt_expiration_hours_must_be_in_range() {
        for hours in ["0", "-5", "9223372036854775807"] {
            let err = config_from(&[
                ("DATABASE_URL", "postgres://localhost/fsri"),
                ("JWT_EXPIRATION_HOURS", hours),
            ])
            .unwrap_err();
            assert!(err.to_string().contains("JWT_EXPIRATION_HOURS"), "{}", hours);
        }

        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/fsri"),
            ("JWT_EXPIRATION_HOURS", "8760"),
        ])
        .unwrap();
        assert_eq!(config.auth.jwt_expiration_hours, 8760);
    }
}
