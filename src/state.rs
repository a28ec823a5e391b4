use deadpool_postgres::Pool;
use redis::aio::ConnectionManager;
use std::sync::Arc;
use crate::config::Config;
use crate::cookies::SessionCookie;
use crate::crypto::field_cipher::FieldCipher;
use crate::crypto::token::TokenSigner;
use crate::error::{AppError, Result};
use crate::middleware_layer::gate::{GatePolicy, SessionGate};

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The Redis connection manager.
    pub redis: ConnectionManager,
    /// The application's configuration.
    pub config: Arc<Config>,
    /// Session verification and cookie handling.
    pub gate: SessionGate,
    /// National ID encryption.
    pub cipher: FieldCipher,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("✅ PostgreSQL pool initialized");

        let redis_client = redis::Client::open(config.redis_url.as_str())?;
        let redis = ConnectionManager::new(redis_client).await?;
        tracing::info!("✅ Redis connection manager initialized");

        let gate = build_gate(&config)?;
        tracing::info!("✅ Session gate initialized (TTL {}h)", config.session_ttl_hours);

        let cipher = FieldCipher::new(config.encryption_key.clone());
        tracing::info!("✅ Field cipher initialized");

        Ok(AppState {
            db,
            redis,
            config: Arc::new(config),
            gate,
            cipher,
        })
    }
}

/// Builds the session gate from configuration.
pub fn build_gate(config: &Config) -> Result<SessionGate> {
    let ttl = config.session_ttl().ok_or_else(|| {
        AppError::Configuration("SESSION_TTL_HOURS is out of range".to_string())
    })?;
    let signer = TokenSigner::new(&config.jwt_secret, ttl)?;
    let cookie = SessionCookie::new(config.production, ttl.num_seconds());
    Ok(SessionGate::new(GatePolicy::default(), signer, cookie))
}
