//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// First-run admin account.
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origin. Any origin is allowed when unset.
    #[serde(default)]
    pub cors_origin: Option<String>,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Redis connection URL. Caching is disabled when unset.
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Time-to-live for cached listings.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: i64,
    /// Key prefix for all Redis keys.
    #[serde(default = "default_cache_prefix")]
    pub prefix: String,
}

/// Bootstrap admin configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapConfig {
    pub admin_username: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            ttl_secs: default_cache_ttl(),
            prefix: default_cache_prefix(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    4000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_cache_ttl() -> i64 {
    60
}

fn default_cache_prefix() -> String {
    "edumatch".to_string()
}

impl BootstrapConfig {
    /// Returns `(username, email, password)` when all three are configured.
    #[must_use]
    pub fn admin_credentials(&self) -> Option<(&str, &str, &str)> {
        match (
            self.admin_username.as_deref(),
            self.admin_email.as_deref(),
            self.admin_password.as_deref(),
        ) {
            (Some(username), Some(email), Some(password)) => Some((username, email, password)),
            _ => None,
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `EDUMATCH_ENV`)
    /// 4. Environment variables with `EDUMATCH__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("EDUMATCH_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("EDUMATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("EDUMATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_sections() {
        let raw = config::Config::builder()
            .set_override("database.url", "postgres://localhost/edumatch")
            .unwrap()
            .build()
            .unwrap();
        let config: Config = raw.try_deserialize().unwrap();

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.database.max_connections, 20);
        assert!(config.cache.redis_url.is_none());
        assert_eq!(config.cache.ttl_secs, 60);
        assert!(config.bootstrap.admin_credentials().is_none());
    }

    #[test]
    fn test_admin_credentials_require_all_fields() {
        let partial = BootstrapConfig {
            admin_username: Some("admin".to_string()),
            admin_email: None,
            admin_password: Some("change-me-now".to_string()),
        };
        assert!(partial.admin_credentials().is_none());

        let full = BootstrapConfig {
            admin_email: Some("admin@example.com".to_string()),
            ..partial
        };
        assert_eq!(
            full.admin_credentials(),
            Some(("admin", "admin@example.com", "change-me-now"))
        );
    }
}
