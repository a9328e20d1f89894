use clap::Parser;
use snaplink_cache::{MemoryCache, RedisCache};
use snaplink_core::{LinkCache, LinkStore};
use snaplink_gateway::cli::{CacheBackendArg, Cli, StorageBackendArg};
use snaplink_gateway::{App, AppState};
use snaplink_generator::RandomGenerator;
use snaplink_service::ShortenerService;
use snaplink_storage::{InMemoryStore, MySqlStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Cli::try_parse()?;

    info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        cache_backend = %config.cache,
        flush_interval_secs = config.flush_interval_secs,
        "starting snaplink gateway"
    );

    match (config.storage, config.cache) {
        (StorageBackendArg::InMemory, CacheBackendArg::Memory) => {
            run(config, InMemoryStore::new(), MemoryCache::new()).await
        }
        (StorageBackendArg::InMemory, CacheBackendArg::Redis) => {
            let cache = redis_cache(&config).await?;
            run(config, InMemoryStore::new(), cache).await
        }
        (StorageBackendArg::Mysql, CacheBackendArg::Memory) => {
            let store = mysql_store(&config).await?;
            run(config, store, MemoryCache::new()).await
        }
        (StorageBackendArg::Mysql, CacheBackendArg::Redis) => {
            let store = mysql_store(&config).await?;
            let cache = redis_cache(&config).await?;
            run(config, store, cache).await
        }
    }
}

async fn mysql_store(config: &Cli) -> Result<MySqlStore, Box<dyn std::error::Error>> {
    let dsn = config
        .mysql_dsn
        .as_deref()
        .ok_or("mysql dsn is required when storage backend is mysql")?;
    let store = MySqlStore::connect(dsn).await?;
    store.migrate().await?;
    Ok(store)
}

async fn redis_cache(config: &Cli) -> Result<RedisCache, Box<dyn std::error::Error>> {
    let url = config
        .redis_url
        .as_deref()
        .ok_or("redis url is required when cache backend is redis")?;
    let client = redis::Client::open(url)?;
    let conn = client.get_multiplexed_async_connection().await?;
    Ok(RedisCache::new(conn))
}

async fn run<S: LinkStore, C: LinkCache>(
    config: Cli,
    store: S,
    cache: C,
) -> Result<(), Box<dyn std::error::Error>> {
    let generator = RandomGenerator::builder()
        .length(config.code_length)
        .alphabet(config.code_alphabet.clone())
        .build();
    let service = ShortenerService::with_max_attempts(store, cache, generator, config.max_attempts);

    let flusher = Arc::clone(service.clicks())
        .spawn_flusher(Duration::from_secs(config.flush_interval_secs));

    let state = AppState::new(Arc::new(service), config.base_url.clone());
    let router = App::router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // One final flush so buffered clicks survive the shutdown.
    flusher.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
