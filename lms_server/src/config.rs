//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use last_man_standing::db::DatabaseConfig;
use last_man_standing::db::timeouts::DEFAULT_TRANSACTION_TIMEOUT;
use last_man_standing::game::{GameSettings, RolloverMode, WinnerMode};
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Upper bound on a single game operation, lock waits included
    pub transaction_timeout: Duration,
    /// Security configuration
    pub security: SecurityConfig,
    /// Settings applied to new games that don't specify their own
    pub game_defaults: GameSettings,
    /// Prometheus exporter address; metrics are disabled when unset
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// JWT signing secret (required)
    pub jwt_secret: String,
    /// Password hashing pepper (required)
    pub password_pepper: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_strict("SERVER_BIND", env("SERVER_BIND"), default_bind())?,
        };

        let development = DatabaseConfig::development();
        let database = DatabaseConfig {
            database_url: database_url_override
                .or_else(|| env("DATABASE_URL"))
                .unwrap_or(development.database_url),
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", development.max_connections),
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", development.min_connections),
            connection_timeout_secs: parse_env_or(
                "DB_CONNECTION_TIMEOUT_SECS",
                development.connection_timeout_secs,
            ),
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT_SECS", development.idle_timeout_secs),
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME_SECS", development.max_lifetime_secs),
        };

        let transaction_timeout = Duration::from_secs(parse_strict(
            "DB_TRANSACTION_TIMEOUT_SECS",
            env("DB_TRANSACTION_TIMEOUT_SECS"),
            DEFAULT_TRANSACTION_TIMEOUT.as_secs(),
        )?);

        // Security configuration (REQUIRED)
        let jwt_secret = env("JWT_SECRET").ok_or_else(|| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        let password_pepper = env("PASSWORD_PEPPER").ok_or_else(|| ConfigError::MissingRequired {
            var: "PASSWORD_PEPPER".to_string(),
            hint: "Generate with: openssl rand -hex 16".to_string(),
        })?;

        let defaults = GameSettings::default();
        let game_defaults = GameSettings {
            winner_mode: parse_strict::<WinnerMode>(
                "DEFAULT_WINNER_MODE",
                env("DEFAULT_WINNER_MODE"),
                defaults.winner_mode,
            )?,
            rollover_mode: parse_strict::<RolloverMode>(
                "DEFAULT_ROLLOVER_MODE",
                env("DEFAULT_ROLLOVER_MODE"),
                defaults.rollover_mode,
            )?,
            max_winners: parse_strict(
                "DEFAULT_MAX_WINNERS",
                env("DEFAULT_MAX_WINNERS"),
                defaults.max_winners,
            )?,
            postpone_as_win: parse_strict(
                "DEFAULT_POSTPONE_AS_WIN",
                env("DEFAULT_POSTPONE_AS_WIN"),
                defaults.postpone_as_win,
            )?,
        };

        let metrics_bind = env("METRICS_BIND")
            .map(|raw| parse_strict("METRICS_BIND", Some(raw), default_bind()))
            .transpose()?;

        Ok(ServerConfig {
            bind,
            database,
            transaction_timeout,
            security: SecurityConfig {
                jwt_secret,
                password_pepper,
            },
            game_defaults,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: "Must be at least 32 characters (128-bit security)".to_string(),
            });
        }

        if self.security.password_pepper.len() < 16 {
            return Err(ConfigError::Invalid {
                var: "PASSWORD_PEPPER".to_string(),
                reason: "Must be at least 16 characters (64-bit security)".to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        if self.transaction_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "DB_TRANSACTION_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.game_defaults.max_winners == 0 {
            return Err(ConfigError::Invalid {
                var: "DEFAULT_MAX_WINNERS".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        if i32::try_from(self.game_defaults.max_winners).is_err() {
            return Err(ConfigError::Invalid {
                var: "DEFAULT_MAX_WINNERS".to_string(),
                reason: format!("Must be at most {}", i32::MAX),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server address ({})", self.bind),
            });
        }

        Ok(())
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

fn default_bind() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8080))
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Parse `raw` if present, rejecting values that don't parse instead of
/// silently falling back.
fn parse_strict<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: key.to_string(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            database: DatabaseConfig {
                database_url: "test".to_string(),
                max_connections: 10,
                min_connections: 1,
                connection_timeout_secs: 5,
                idle_timeout_secs: 300,
                max_lifetime_secs: 1800,
            },
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
            security: SecurityConfig {
                jwt_secret: "a".repeat(32),
                password_pepper: "a".repeat(16),
            },
            game_defaults: GameSettings::default(),
            metrics_bind: None,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("JWT_SECRET"));
        assert!(msg.contains("Use openssl"));
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_short_secret() {
        let mut config = config();
        config.security.jwt_secret = "too-short".to_string();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "JWT_SECRET"));
    }

    #[test]
    fn test_config_validation_short_pepper() {
        let mut config = config();
        config.security.password_pepper = "pepper".to_string();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "PASSWORD_PEPPER"));
    }

    #[test]
    fn test_config_validation_pool_bounds() {
        let mut config = config();
        config.database.min_connections = 20;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "DB_MIN_CONNECTIONS"));
    }

    #[test]
    fn test_config_validation_zero_max_winners() {
        let mut config = config();
        config.game_defaults.max_winners = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_max_winners_beyond_column_range() {
        let mut config = config();
        config.game_defaults.max_winners = 3_000_000_000;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "DEFAULT_MAX_WINNERS"));
    }

    #[test]
    fn test_config_validation_zero_transaction_timeout() {
        let mut config = config();
        config.transaction_timeout = Duration::ZERO;

        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { ref var, .. } if var == "DB_TRANSACTION_TIMEOUT_SECS")
        );
    }

    #[test]
    fn test_config_validation_metrics_port_clash() {
        let mut config = config();
        config.metrics_bind = Some(config.bind);

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_strict_modes() {
        assert_eq!(
            parse_strict("DEFAULT_WINNER_MODE", Some("multiple".to_string()), WinnerMode::Single)
                .unwrap(),
            WinnerMode::Multiple
        );
        assert_eq!(
            parse_strict("DEFAULT_ROLLOVER_MODE", None, RolloverMode::Round).unwrap(),
            RolloverMode::Round
        );

        let err = parse_strict("DEFAULT_ROLLOVER_MODE", Some("season".to_string()), RolloverMode::Round)
            .unwrap_err();
        assert!(err.to_string().contains("DEFAULT_ROLLOVER_MODE"));
    }

    #[test]
    fn test_parse_strict_rejects_misspelled_bool() {
        assert!(parse_strict("DEFAULT_POSTPONE_AS_WIN", Some("true".to_string()), false).unwrap());

        let err = parse_strict("DEFAULT_POSTPONE_AS_WIN", Some("yes".to_string()), false)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "DEFAULT_POSTPONE_AS_WIN"));
    }
}
