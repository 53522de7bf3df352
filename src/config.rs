/// Configuration management for the blog API
///
/// Loads configuration from environment variables (`.env` is read in `main`).
use anyhow::{Context, Result};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub maintenance: MaintenanceConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
    /// Min connections in pool
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret for access tokens
    pub jwt_secret: String,
    /// Token lifetime in seconds
    pub jwt_ttl_secs: i64,
}

#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Period of the recommended-friends rebuild and read-activity cleanup
    pub interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app = AppConfig {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("PORT").and_then(|s| s.parse().ok()).unwrap_or(3000),
        };

        let database = DatabaseConfig {
            url: lookup("DATABASE_URL").context("DATABASE_URL environment variable not set")?,
            max_connections: lookup("DB_MAX_CONNECTIONS").and_then(|s| s.parse().ok()).unwrap_or(20),
            min_connections: lookup("DB_MIN_CONNECTIONS").and_then(|s| s.parse().ok()).unwrap_or(1),
        };

        let auth = AuthConfig {
            jwt_secret: lookup("JWT_SECRET").context("JWT_SECRET environment variable not set")?,
            jwt_ttl_secs: lookup("JWT_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(86_400),
        };

        let maintenance = MaintenanceConfig {
            interval_secs: lookup("MAINTENANCE_INTERVAL_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(3_600),
        };

        Ok(Config {
            app,
            database,
            auth,
            maintenance,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://test"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.app.host, "0.0.0.0");
        assert_eq!(config.app.port, 3000);
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(config.auth.jwt_ttl_secs, 86_400);
        assert_eq!(config.maintenance.interval_secs, 3_600);
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("JWT_SECRET", "secret"),
            ("PORT", "8080"),
            ("DB_MAX_CONNECTIONS", "not-a-number"),
            ("MAINTENANCE_INTERVAL_SECS", "60"),
        ]))
        .unwrap();

        assert_eq!(config.app.port, 8080);
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.maintenance.interval_secs, 60);
    }

    #[test]
    fn test_missing_required() {
        assert!(Config::from_lookup(lookup_from(&[("JWT_SECRET", "s")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("DATABASE_URL", "x")])).is_err());
    }
}
