// ⚙️ Server Configuration
// Read once at startup from flags or environment; never reloaded

use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

/// Default token lifetime, shared by registration and login
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

// ============================================================================
// CONFIG ERRORS
// ============================================================================

/// Fatal startup errors. Never produced per request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("signing key is missing (set JWT_SECRET or pass --jwt-secret)")]
    MissingSigningKey,

    #[error("token ttl must be a positive number of days, got {0}")]
    InvalidTtl(i64),
}

// ============================================================================
// SERVER CONFIG
// ============================================================================

/// Finance tracker API server.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[arg(long, env = "FINANCE_DB", default_value = "finance.db")]
    pub database: PathBuf,

    /// Address to listen on.
    #[arg(long, env = "FINANCE_BIND", default_value = "0.0.0.0:5000")]
    pub bind: String,

    /// Secret used to sign bearer tokens.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Lifetime of issued tokens, in days.
    #[arg(long, env = "TOKEN_TTL_DAYS", default_value_t = DEFAULT_TOKEN_TTL_DAYS)]
    pub token_ttl_days: i64,
}

impl ServerConfig {
    /// Token lifetime as a duration
    pub fn token_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        if self.token_ttl_days <= 0 {
            return Err(ConfigError::InvalidTtl(self.token_ttl_days));
        }
        chrono::Duration::try_days(self.token_ttl_days).ok_or(ConfigError::InvalidTtl(self.token_ttl_days))
    }

    /// Signing key, rejecting absent or blank values
    pub fn signing_key(&self) -> Result<&str, ConfigError> {
        match self.jwt_secret.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::MissingSigningKey),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::try_parse_from(["finance-server", "--jwt-secret", "s3cret"]).unwrap();

        assert_eq!(config.database, PathBuf::from("finance.db"));
        assert_eq!(config.bind, "0.0.0.0:5000");
        assert_eq!(config.token_ttl().unwrap(), chrono::Duration::days(7));
        assert_eq!(config.signing_key().unwrap(), "s3cret");
    }

    #[test]
    fn test_blank_secret_is_missing() {
        let config = ServerConfig::try_parse_from(["finance-server", "--jwt-secret", "   "]).unwrap();
        assert_eq!(config.signing_key(), Err(ConfigError::MissingSigningKey));
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let config = ServerConfig::try_parse_from([
            "finance-server",
            "--jwt-secret",
            "k",
            "--token-ttl-days",
            "0",
        ])
        .unwrap();

        assert_eq!(config.token_ttl(), Err(ConfigError::InvalidTtl(0)));
    }

    #[test]
    fn test_huge_ttl_is_config_error() {
        let config = ServerConfig::try_parse_from([
            "finance-server",
            "--jwt-secret",
            "k",
            "--token-ttl-days",
            "9223372036854775807",
        ])
        .unwrap();

        assert_eq!(config.token_ttl(), Err(ConfigError::InvalidTtl(i64::MAX)));
    }
}
