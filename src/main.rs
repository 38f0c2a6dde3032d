//! C-News - a server-rendered news portal

use anyhow::Result;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cnews::{
    config::Config,
    web::{self, AppState},
};

/// How often stale login-failure records are dropped
const LIMITER_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cnews=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting C-News portal...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded, content API at {}", config.api.normalized_base_url());

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Cache, API client, sessions and theme
    let state = AppState::new(config)?;
    match state.theme.override_path() {
        Some(path) => tracing::info!("Theme engine initialized with overrides from {:?}", path),
        None => tracing::info!("Theme engine initialized with embedded templates"),
    }

    // Start rate limiter cleanup task
    {
        let limiter = state.auth.limiter().clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(LIMITER_CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                limiter.cleanup().await;
            }
        });
    }

    // Build router
    let app = web::build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
