use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use cinerec_api::api::{create_router, AppState};
use cinerec_api::config::Config;
use cinerec_api::db::{create_pool, seed::seed_catalog, SqliteStore};
use cinerec_api::services::providers::{DeepSeekProvider, SuggestionProvider};
use cinerec_api::services::SessionStore;

const SWEEP_PERIOD: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    info!("Configuration loaded");

    let pool = create_pool(&config.database_url).await?;
    let store = SqliteStore::new(pool.clone());
    store.migrate().await?;
    seed_catalog(&pool).await?;
    info!(database_url = %config.database_url, "Database ready");

    let suggester: Option<Arc<dyn SuggestionProvider>> = match &config.suggestion_api_key {
        Some(key) => Some(Arc::new(DeepSeekProvider::new(
            config.suggestion_api_url.clone(),
            key.clone(),
            config.suggestion_model.clone(),
        ))),
        None => {
            info!("SUGGESTION_API_KEY unset; external suggestions disabled");
            None
        }
    };

    let sessions = SessionStore::new(config.session_ttl());
    let sweeper = sessions.spawn_sweeper(SWEEP_PERIOD);

    let state = AppState::new(
        Arc::new(store),
        suggester,
        sessions,
        config.suggestion_timeout(),
    );
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.shutdown().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
