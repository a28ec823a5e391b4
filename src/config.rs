use std::env;
use std::net::SocketAddr;
use anyhow::{Context, Result};
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::field_cipher::FieldKey;

/// The placeholder secret shipped with the old deployment templates.
pub const PLACEHOLDER_SECRET: &str = "your-secret-key-change-in-production";

/// The longest session lifetime accepted from configuration.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The URL of the Redis server.
    pub redis_url: String,
    /// The secret used to sign session tokens.
    pub jwt_secret: Zeroizing<Vec<u8>>,
    /// The key used to encrypt national IDs.
    pub encryption_key: FieldKey,
    /// How long a session lasts, in hours.
    pub session_ttl_hours: i64,
    /// Whether the service runs in production.
    pub production: bool,
    /// The address to listen on.
    pub bind_addr: SocketAddr,
    /// The directory with the built UI.
    pub static_dir: String,
    /// Whether admin API calls re-check the admin's current record.
    pub check_active_admin: bool,
    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let production = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string()) == "production";

        let jwt_secret = env::var("JWT_SECRET")
            .context("JWT_SECRET must be set (generate with: openssl rand -hex 32)")?;
        let jwt_secret = validate_secret(jwt_secret, production)?;

        let mut encryption_key_hex = env::var("ENCRYPTION_KEY")
            .context("ENCRYPTION_KEY must be set (generate with: openssl rand -hex 32)")?;
        let encryption_key = FieldKey::from_hex(&encryption_key_hex)
            .context("ENCRYPTION_KEY must be exactly 32 bytes (64 hex characters)");
        encryption_key_hex.zeroize();
        let encryption_key = encryption_key?;

        let session_ttl_hours = parse_session_ttl_hours(
            &env::var("SESSION_TTL_HOURS").unwrap_or_else(|_| "24".to_string()),
        )?;

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            jwt_secret,
            encryption_key,
            session_ttl_hours,
            production,
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
                .parse()
                .context("Invalid BIND_ADDR")?,
            static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "public".to_string()),
            check_active_admin: env::var("AUTH_CHECK_ACTIVE_ADMIN")
                .map(|v| parse_flag(&v))
                .unwrap_or(Ok(true))
                .context("Invalid AUTH_CHECK_ACTIVE_ADMIN")?,
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string())
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        })
    }

    /// The session lifetime as a `chrono::Duration`.
    ///
    /// `None` when `session_ttl_hours` does not fit a `Duration`.
    pub fn session_ttl(&self) -> Option<chrono::Duration> {
        chrono::Duration::try_hours(self.session_ttl_hours)
    }
}

/// Rejects empty secrets, and the placeholder secret in production.
fn validate_secret(mut secret: String, production: bool) -> Result<Zeroizing<Vec<u8>>> {
    if secret.trim().is_empty() {
        anyhow::bail!("JWT_SECRET must not be empty");
    }

    if secret == PLACEHOLDER_SECRET {
        if production {
            secret.zeroize();
            anyhow::bail!("JWT_SECRET is set to the placeholder value; refusing to start in production");
        }
        tracing::warn!("⚠️  JWT_SECRET is the placeholder value; do not deploy this configuration");
    } else if secret.len() < 32 {
        tracing::warn!("⚠️  JWT_SECRET is shorter than 32 bytes");
    }

    let bytes = Zeroizing::new(secret.as_bytes().to_vec());
    secret.zeroize();
    Ok(bytes)
}

/// Parses `SESSION_TTL_HOURS`, bounded to one year.
fn parse_session_ttl_hours(value: &str) -> Result<i64> {
    let hours: i64 = value.trim().parse().context("Invalid SESSION_TTL_HOURS")?;
    if hours <= 0 {
        anyhow::bail!("SESSION_TTL_HOURS must be positive");
    }
    if hours > MAX_SESSION_TTL_HOURS {
        anyhow::bail!("SESSION_TTL_HOURS must not exceed {MAX_SESSION_TTL_HOURS}");
    }
    Ok(hours)
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_secret_rejected_in_production() {
        assert!(validate_secret(PLACEHOLDER_SECRET.to_string(), true).is_err());
        assert!(validate_secret(PLACEHOLDER_SECRET.to_string(), false).is_ok());
    }

    #[test]
    fn empty_secret_rejected() {
        assert!(validate_secret("   ".to_string(), false).is_err());
    }

    #[test]
    fn secret_bytes_preserved() {
        let secret = validate_secret("a-long-enough-secret-for-signing-tokens".to_string(), true)
            .unwrap();
        assert_eq!(secret.as_slice(), b"a-long-enough-secret-for-signing-tokens");
    }

    #[test]
    fn session_ttl_is_bounded() {
        assert_eq!(parse_session_ttl_hours("24").unwrap(), 24);
        assert_eq!(parse_session_ttl_hours(" 8760 ").unwrap(), MAX_SESSION_TTL_HOURS);
        assert!(parse_session_ttl_hours("0").is_err());
        assert!(parse_session_ttl_hours("-5").is_err());
        assert!(parse_session_ttl_hours("8761").is_err());
        assert!(parse_session_ttl_hours("3000000000").is_err());
        assert!(parse_session_ttl_hours("a day").is_err());
    }

    #[test]
    fn flags() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(!parse_flag("off").unwrap());
        assert!(parse_flag("maybe").is_err());
    }
}
