//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use authgate::{
    auth::HashingParams,
    db::{DatabaseConfig, config::DEFAULT_DATABASE_URL},
};
use std::{fmt, net::SocketAddr};

/// Bind address used when neither `--bind` nor `SERVER_BIND` is given
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Default access token lifetime in seconds
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 900;

/// Longest accepted access token lifetime (30 days)
pub const MAX_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Which credential store to run against
    pub store: StoreBackend,
    /// Database configuration (used by the PostgreSQL backend)
    pub database: DatabaseConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Argon2 work factor
    pub hashing: HashingParams,
    /// Prometheus listener address, if metrics export is enabled
    pub metrics_bind: Option<SocketAddr>,
}

/// Credential store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Security-related configuration
#[derive(Clone)]
pub struct SecurityConfig {
    /// JWT signing secret (required)
    pub jwt_secret: String,
    /// Access token lifetime in seconds
    pub token_ttl_secs: i64,
    /// Password hashing pepper (optional)
    pub password_pepper: Option<String>,
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field(
                "password_pepper",
                &self.password_pepper.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Values given on the command line, which win over the environment
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind: Option<SocketAddr>,
    pub database_url: Option<String>,
    pub memory_store: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(overrides: CliOverrides) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), overrides)
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F, overrides: CliOverrides) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Bind address
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => match parse_addr(&lookup, "SERVER_BIND")? {
                Some(bind) => bind,
                None => DEFAULT_BIND.parse().map_err(|_| ConfigError::Invalid {
                    var: "SERVER_BIND".to_string(),
                    reason: format!("Default `{DEFAULT_BIND}` is not an IP:PORT address"),
                })?,
            },
        };

        let store = if overrides.memory_store {
            StoreBackend::Memory
        } else {
            match lookup("CREDENTIAL_STORE").as_deref().map(str::to_lowercase).as_deref() {
                None | Some("postgres") => StoreBackend::Postgres,
                Some("memory") => StoreBackend::Memory,
                Some(other) => {
                    return Err(ConfigError::Invalid {
                        var: "CREDENTIAL_STORE".to_string(),
                        reason: format!("Expected `postgres` or `memory`, got `{other}`"),
                    });
                }
            }
        };

        // Database configuration
        let defaults = DatabaseConfig::development();
        let database = DatabaseConfig {
            database_url: overrides
                .database_url
                .or_else(|| lookup("DATABASE_URL"))
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", defaults.min_connections),
            connection_timeout_secs: parse_or(
                &lookup,
                "DB_CONNECTION_TIMEOUT_SECS",
                defaults.connection_timeout_secs,
            ),
            idle_timeout_secs: parse_or(
                &lookup,
                "DB_IDLE_TIMEOUT_SECS",
                defaults.idle_timeout_secs,
            ),
            max_lifetime_secs: parse_or(
                &lookup,
                "DB_MAX_LIFETIME_SECS",
                defaults.max_lifetime_secs,
            ),
        };

        // Security configuration (REQUIRED)
        let jwt_secret = lookup("JWT_SECRET").ok_or_else(|| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        let security = SecurityConfig {
            jwt_secret,
            token_ttl_secs: parse_or(&lookup, "TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS),
            password_pepper: lookup("PASSWORD_PEPPER").filter(|p| !p.is_empty()),
        };

        let default_hashing = HashingParams::default();
        let hashing = HashingParams {
            memory_kib: parse_or(&lookup, "ARGON2_MEMORY_KIB", default_hashing.memory_kib),
            iterations: parse_or(&lookup, "ARGON2_ITERATIONS", default_hashing.iterations),
            parallelism: parse_or(&lookup, "ARGON2_PARALLELISM", default_hashing.parallelism),
        };

        let metrics_bind = parse_addr(&lookup, "METRICS_BIND")?;

        let config = ServerConfig {
            bind,
            store,
            database,
            security,
            hashing,
            metrics_bind,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: "Must be at least 32 characters (128-bit security)".to_string(),
            });
        }

        if self
            .security
            .password_pepper
            .as_ref()
            .is_some_and(|pepper| pepper.len() < 16)
        {
            return Err(ConfigError::Invalid {
                var: "PASSWORD_PEPPER".to_string(),
                reason: "Must be at least 16 characters (64-bit security)".to_string(),
            });
        }

        if !(1..=MAX_TOKEN_TTL_SECS).contains(&self.security.token_ttl_secs) {
            return Err(ConfigError::Invalid {
                var: "TOKEN_TTL_SECS".to_string(),
                reason: format!("Must be between 1 and {MAX_TOKEN_TTL_SECS}"),
            });
        }

        if self.hashing.iterations == 0 || self.hashing.parallelism == 0 {
            return Err(ConfigError::Invalid {
                var: "ARGON2_ITERATIONS / ARGON2_PARALLELISM".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        let min_memory_kib = self.hashing.parallelism.saturating_mul(8);
        if self.hashing.memory_kib < min_memory_kib {
            return Err(ConfigError::Invalid {
                var: "ARGON2_MEMORY_KIB".to_string(),
                reason: format!("Must be at least 8 * parallelism ({min_memory_kib})"),
            });
        }

        if self.store == StoreBackend::Postgres
            && self.database.max_connections < self.database.min_connections
        {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: format!(
                    "Must be at least DB_MIN_CONNECTIONS ({})",
                    self.database.min_connections
                ),
            });
        }

        Ok(())
    }

    /// Access token lifetime
    pub fn token_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        chrono::Duration::try_seconds(self.security.token_ttl_secs).ok_or_else(|| {
            ConfigError::Invalid {
                var: "TOKEN_TTL_SECS".to_string(),
                reason: format!("`{}` seconds is out of range", self.security.token_ttl_secs),
            }
        })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse a variable with default fallback
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Socket addresses are not defaulted silently: a typo is an error
fn parse_addr<F>(lookup: &F, key: &str) -> Result<Option<SocketAddr>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.parse().map_err(|_| ConfigError::Invalid {
                var: key.to_string(),
                reason: format!("`{raw}` is not an IP:PORT address"),
            })
        })
        .transpose()
}
