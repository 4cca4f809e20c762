use std::sync::Arc;

use movie_explorer::{
    config::Config,
    logging,
    routes::{create_router, AppState},
    services::{MovieProvider, OmdbProvider, PreferencesStore, SessionRegistry, WatchlistStore},
    storage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let config = Config::from_env()?;
    let storage = storage::create_storage(&config)?;

    let provider: Arc<dyn MovieProvider> = Arc::new(OmdbProvider::new(
        config.omdb_api_key.clone(),
        config.omdb_api_url.clone(),
        config.search_result_limit,
    ));

    // Hydration runs in the background; requests are served immediately
    let (watchlist, watchlist_writer) = WatchlistStore::new(storage.clone());
    let preferences = PreferencesStore::load(storage).await;
    let sessions = SessionRegistry::new(
        provider.clone(),
        config.debounce_delay(),
        config.session_idle_timeout(),
    );
    let sweeper = sessions.spawn_idle_sweeper();

    let state = AppState::new(provider, watchlist, preferences.clone(), sessions);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(
        address = %config.bind_address(),
        debounce_ms = config.debounce_ms,
        "Server running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    watchlist_writer.shutdown().await;
    preferences.flush().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
