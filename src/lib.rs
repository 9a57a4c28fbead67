pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use cache::{shared_tier, CacheWriterHandle, DiskCache, MemoryCache};
use config::Config;
use routes::AppState;
use services::{CacheTiers, MetadataProxy, TmdbClient};

/// Everything `main` needs to run the service
pub struct App {
    pub state: Arc<AppState>,
    pub memory: Arc<MemoryCache>,
    pub cache_writer: Option<CacheWriterHandle>,
}

/// Wires the cache tiers, upstream client and proxy from configuration
pub fn build_app(config: Config) -> App {
    let memory = Arc::new(MemoryCache::new());
    let disk = Arc::new(DiskCache::new(config.cache_dir.clone()));
    let (shared, cache_writer) = shared_tier(config.shared_cache_url().as_deref());

    let tiers = CacheTiers {
        memory: memory.clone(),
        disk,
        shared,
    };
    let upstream = Arc::new(TmdbClient::new(config.app_env));
    let proxy = Arc::new(MetadataProxy::new(&config, tiers, upstream));

    App {
        state: Arc::new(AppState::new(proxy, config)),
        memory,
        cache_writer,
    }
}
