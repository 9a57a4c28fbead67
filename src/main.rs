use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use grouppy_api::{build_app, cache::MemoryCache, config::Config, routes::create_router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How often expired entries are dropped from the memory tier
const MEMORY_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "grouppy_api=info,tower_http=info".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.credentials().resolve().is_err() {
        tracing::warn!("No TMDB credentials configured, proxy requests will fail");
    }

    let address = config.bind_address();
    let app = build_app(config);
    let sweeper = tokio::spawn(sweep_memory_tier(app.memory.clone()));

    let router = create_router(app.state);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    if let Some(writer) = app.cache_writer {
        writer.shutdown().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Periodically evicts memory entries too old to ever be served
async fn sweep_memory_tier(memory: Arc<MemoryCache>) {
    let mut interval = tokio::time::interval(MEMORY_SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        let removed = memory.sweep_expired(Utc::now());
        if removed > 0 {
            tracing::debug!(removed, remaining = memory.len(), "Swept expired memory cache entries");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
