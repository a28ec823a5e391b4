use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cisa::{config::Config, db, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let addr = config.bind_addr;

    let state = AppState::new(config).await?;
    tracing::info!("✅ AppState initialized");

    if let Err(e) = db::ensure_schema(&state.db).await {
        tracing::error!("❌ Failed to apply database schema: {}", e);
        return Err(e.into());
    }

    for origin in &state.config.cors_origins {
        if origin.parse::<http::HeaderValue>().is_err() {
            tracing::warn!("⚠️  Ignoring invalid CORS origin: {}", origin);
        }
    }

    let app = routes::build_router(state)?;

    tracing::info!("🚀 Server listening on http://{}", addr);
    tracing::info!("✅ All systems operational");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
