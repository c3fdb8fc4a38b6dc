//! Configuration for tokengate
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::auth::SigningKey;
use crate::types::{Result, TokengateError};

/// tokengate - token issuing and request authentication service
#[derive(Parser, Debug, Clone)]
#[command(name = "tokengate")]
#[command(about = "Registration, login and bearer-token authentication service")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (built-in signing key, in-memory fallback)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Token signing secret (required in production)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Decode JWT_SECRET as standard base64 instead of raw bytes
    #[arg(long, env = "JWT_SECRET_BASE64", default_value = "false")]
    pub jwt_secret_base64: bool,

    /// Token lifetime in milliseconds
    #[arg(long, env = "JWT_TTL_MS", default_value = "86400000")]
    pub jwt_ttl_ms: u64,

    /// Upper bound on the principal lookup made by the authentication gate
    #[arg(long, env = "LOOKUP_TIMEOUT_MS", default_value = "5000")]
    pub lookup_timeout_ms: u64,

    /// MongoDB connection URI (principals are kept in memory when unset)
    #[arg(long, env = "MONGODB_URI")]
    pub mongodb_uri: Option<String>,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "tokengate")]
    pub mongodb_db: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format (text or json)
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,
}

impl Args {
    /// Build the signing key; dev mode falls back to the built-in key
    pub fn signing_key(&self) -> Result<SigningKey> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) if self.jwt_secret_base64 => SigningKey::from_base64(secret),
            (Some(secret), _) => SigningKey::from_bytes(secret.as_bytes()),
            (None, true) => Ok(SigningKey::new_dev()),
            (None, false) => Err(TokengateError::Config(
                "JWT_SECRET is required in production mode".into(),
            )),
        }
    }

    /// Out-of-range values come back as zero, which the codec rejects
    pub fn token_ttl(&self) -> chrono::Duration {
        i64::try_from(self.jwt_ttl_ms)
            .ok()
            .and_then(chrono::Duration::try_milliseconds)
            .unwrap_or_else(chrono::Duration::zero)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        if self.jwt_ttl_ms == 0 {
            return Err("JWT_TTL_MS must be greater than zero".to_string());
        }

        if self.token_ttl().is_zero() {
            return Err("JWT_TTL_MS is out of range".to_string());
        }

        if self.lookup_timeout_ms == 0 {
            return Err("LOOKUP_TIMEOUT_MS must be greater than zero".to_string());
        }

        if self.jwt_secret.is_some() {
            self.signing_key().map_err(|e| e.to_string())?;
        }

        Ok(())
    }
}
