//! Recency demo binary.
//!
//! Runs the LRU walkthrough, then a concurrent cache-aside load against a
//! simulated user directory, and prints the resulting statistics as JSON.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use recency::cache::CacheRegistry;
use recency::config::Config;
use recency::demo::{self, UserDirectory, UserService};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("recency=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    // Also loads .env, if present
    let config = Config::from_env()?;
    info!(capacity = config.cache.capacity, "Configuration loaded");

    demo::walkthrough::run()?;

    let registry = CacheRegistry::new();
    let directory = Arc::new(UserDirectory::new(config.lookup_delay));
    let service = Arc::new(UserService::new(directory, &registry, &config)?);

    let report = demo::users::run_load(service, &config).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
