//! Configuration management for the server.
//!
//! Loads configuration from environment variables with sensible defaults.
//! [`Config::from_lookup`] takes any key lookup so tests never touch the
//! process environment.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but does not parse.
    #[error("{key} has invalid value {value:?}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
    },
    /// `STORAGE_BACKEND` is neither `memory` nor `postgres`.
    #[error("unknown storage backend {0:?} (expected memory or postgres)")]
    UnknownBackend(String),
    /// The postgres backend needs a connection URL.
    #[error("DATABASE_URL is required when STORAGE_BACKEND=postgres")]
    MissingDatabaseUrl,
    /// A listener port is zero.
    #[error("{0} must be a non-zero port")]
    ZeroPort(&'static str),
    /// Pool bounds are inverted.
    #[error("DATABASE_MIN_CONNECTIONS ({min}) exceeds DATABASE_MAX_CONNECTIONS ({max})")]
    PoolBounds {
        /// Minimum idle connections.
        min: u32,
        /// Maximum connections.
        max: u32,
    },
    /// Only some of the admin seed variables are set.
    #[error("ADMIN_EMAIL and ADMIN_PASSWORD must be set together")]
    PartialAdminSeed,
}

/// Where catalog and user records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process memory. Lost on restart.
    Memory,
    /// `PostgreSQL` via `sqlx`.
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Memory => "memory",
            Self::Postgres => "postgres",
        })
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listener.
    pub server: ServerConfig,
    /// Prometheus exporter.
    pub metrics: MetricsConfig,
    /// Storage backend.
    pub storage: StorageConfig,
    /// Sessions and admin seeding.
    pub auth: AuthSettings,
    /// Single allowed CORS origin; any origin when `None`.
    pub cors_allowed_origin: Option<String>,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// `EnvFilter` directives
    pub log_level: String,
    /// How long in-flight requests get after a shutdown signal
    pub shutdown_timeout: Duration,
}

/// Metrics exporter configuration
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether to serve `/metrics` at all
    pub enabled: bool,
    /// Metrics server host
    pub host: String,
    /// Metrics server port
    pub port: u16,
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Selected backend
    pub backend: StorageBackend,
    /// `PostgreSQL` connection URL
    pub database_url: Option<String>,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections in the pool
    pub min_connections: u32,
    /// Connection timeout
    pub connect_timeout: Duration,
}

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Bearer token lifetime
    pub session_ttl: Duration,
    /// Admin account created or refreshed at startup
    pub admin: Option<AdminAccount>,
}

/// Admin seed credentials.
#[derive(Clone)]
pub struct AdminAccount {
    /// Display name
    pub username: String,
    /// Email address
    pub email: String,
    /// Plain-text password
    pub password: String,
}

impl fmt::Debug for AdminAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminAccount")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Default `EnvFilter` directives.
pub const DEFAULT_LOG_LEVEL: &str = "info,sweet_shop=debug,sqlx=warn";

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Config::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, then validate it.
    ///
    /// Unset and blank variables take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unparseable values or an inconsistent
    /// combination (see [`Config::validate`]).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let config = Self {
            server: ServerConfig {
                host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&get, "PORT", 8080)?,
                log_level: get("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
                shutdown_timeout: Duration::from_secs(parse_or(&get, "SHUTDOWN_TIMEOUT", 30)?),
            },
            metrics: MetricsConfig {
                enabled: parse_flag(&get, "METRICS_ENABLED", true)?,
                host: get("METRICS_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&get, "METRICS_PORT", 9090)?,
            },
            storage: StorageConfig {
                backend: get("STORAGE_BACKEND")
                    .map_or(Ok(StorageBackend::Memory), |raw| raw.parse())?,
                database_url: get("DATABASE_URL"),
                max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: parse_or(&get, "DATABASE_MIN_CONNECTIONS", 2)?,
                connect_timeout: Duration::from_secs(parse_or(
                    &get,
                    "DATABASE_CONNECT_TIMEOUT",
                    30,
                )?),
            },
            auth: AuthSettings {
                session_ttl: Duration::from_secs(parse_or(&get, "AUTH_SESSION_TTL", 86_400)?),
                admin: match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
                    (Some(email), Some(password)) => Some(AdminAccount {
                        username: get("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
                        email,
                        password,
                    }),
                    (None, None) => None,
                    _ => return Err(ConfigError::PartialAdminSeed),
                },
            },
            cors_allowed_origin: get("CORS_ALLOWED_ORIGIN"),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingDatabaseUrl`] for postgres without a URL
    /// - [`ConfigError::ZeroPort`] for a zero listener port
    /// - [`ConfigError::PoolBounds`] when min exceeds max connections
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == StorageBackend::Postgres && self.storage.database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if self.server.port == 0 {
            return Err(ConfigError::ZeroPort("PORT"));
        }
        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(ConfigError::ZeroPort("METRICS_PORT"));
        }
        if self.storage.min_connections > self.storage.max_connections {
            return Err(ConfigError::PoolBounds {
                min: self.storage.min_connections,
                max: self.storage.max_connections,
            });
        }
        Ok(())
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    get(key).map_or(Ok(default), |value| {
        value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value })
    })
}

fn parse_flag(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match get(key).map(|v| v.to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(value) => Err(ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    impl Config {
        fn from_map(vars: &HashMap<&str, &str>) -> Result<Self, ConfigError> {
            Self::from_lookup(|key| vars.get(key).map(|v| (*v).to_string()))
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_map(&HashMap::new()).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.server.shutdown_timeout, Duration::from_secs(30));
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.port, 9090);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.max_connections, 10);
        assert_eq!(config.storage.min_connections, 2);
        assert_eq!(config.auth.session_ttl, Duration::from_secs(86_400));
        assert!(config.auth.admin.is_none());
        assert!(config.cors_allowed_origin.is_none());
    }

    #[test]
    fn test_overrides() {
        let vars = HashMap::from([
            ("PORT", "3000"),
            ("METRICS_ENABLED", "false"),
            ("STORAGE_BACKEND", "Postgres"),
            ("DATABASE_URL", "postgres://localhost/sweets"),
            ("ADMIN_EMAIL", "admin@example.com"),
            ("ADMIN_PASSWORD", "admin1234"),
            ("CORS_ALLOWED_ORIGIN", "http://localhost:5173"),
        ]);
        let config = Config::from_map(&vars).unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(!config.metrics.enabled);
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        let admin = config.auth.admin.unwrap();
        assert_eq!(admin.username, "admin");
        assert!(!format!("{admin:?}").contains("admin1234"));
        assert_eq!(config.cors_allowed_origin.as_deref(), Some("http://localhost:5173"));
    }

    #[test]
    fn test_blank_values_take_defaults() {
        let config = Config::from_map(&HashMap::from([("PORT", "  ")])).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_rejections() {
        let cases: [(&[(&str, &str)], ConfigError); 6] = [
            (
                &[("PORT", "eighty")],
                ConfigError::Invalid {
                    key: "PORT",
                    value: "eighty".to_string(),
                },
            ),
            (&[("PORT", "0")], ConfigError::ZeroPort("PORT")),
            (
                &[("STORAGE_BACKEND", "sqlite")],
                ConfigError::UnknownBackend("sqlite".to_string()),
            ),
            (&[("STORAGE_BACKEND", "postgres")], ConfigError::MissingDatabaseUrl),
            (
                &[("DATABASE_MIN_CONNECTIONS", "20")],
                ConfigError::PoolBounds { min: 20, max: 10 },
            ),
            (&[("ADMIN_EMAIL", "admin@example.com")], ConfigError::PartialAdminSeed),
        ];
        for (vars, expected) in cases {
            let vars: HashMap<&str, &str> = vars.iter().copied().collect();
            assert_eq!(Config::from_map(&vars).unwrap_err(), expected);
        }
    }
}
