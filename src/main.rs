use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use collections_api::app::{app, cors_layer, AppState};
use collections_api::config::config;
use collections_api::database::{DatabaseManager, PgStore};
use collections_api::is_production;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = config();
    tracing::info!("Starting collections API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        if is_production!() {
            anyhow::bail!("JWT_SECRET_KEY must be set in production");
        }
        tracing::warn!("JWT_SECRET_KEY is empty; tokens cannot be issued or verified");
    }

    let pool = DatabaseManager::connect_lazy(&config.database).context("database configuration")?;
    if let Err(e) = DatabaseManager::migrate(&pool).await {
        // Keep serving; /health reports the database as unavailable
        tracing::error!("Failed to apply migrations: {}", e);
    }

    let store = Arc::new(PgStore::new(pool.clone()));
    let state = AppState::new(store, config).with_pool(pool);
    let router = app(state, cors_layer(&config.security.cors_origins));

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Collections API listening on http://{}", bind_addr);

    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("server error")?;

    Ok(())
}
