//! Cache-aside user lookups.
//!
//! `UserService` answers `get_user` from its cache when it can and falls
//! back to a slow `UserDirectory` on a miss, caching what it fetched.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Context;
use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::{CacheRegistry, CacheStats, TypedCache};
use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("user {0} does not exist")]
    NotFound(u64),
}

/// Simulated backing store with a fixed lookup latency.
#[derive(Debug)]
pub struct UserDirectory {
    delay: Duration,
    lookups: AtomicU64,
}

impl UserDirectory {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            lookups: AtomicU64::new(0),
        }
    }

    /// Fetch a user. Id 0 is never assigned.
    pub async fn fetch(&self, id: u64) -> Result<User, DirectoryError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if id == 0 {
            return Err(DirectoryError::NotFound(id));
        }
        Ok(User {
            id,
            name: format!("User {id}"),
            email: format!("{id}@example.com"),
        })
    }

    /// Number of fetches served so far.
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }
}

/// User lookups backed by a named cache.
pub struct UserService {
    directory: Arc<UserDirectory>,
    cache: TypedCache<String, Arc<User>>,
}

impl UserService {
    /// Name of the cache this service registers.
    pub const CACHE_NAME: &'static str = "users";

    /// Create the service, creating or reusing the `users` cache in `registry`.
    pub fn new(
        directory: Arc<UserDirectory>,
        registry: &CacheRegistry,
        config: &Config,
    ) -> crate::cache::Result<Self> {
        let cache = registry.get_or_create(Self::CACHE_NAME, config.cache.clone())?;
        Ok(Self { directory, cache })
    }

    fn cache_key(id: u64) -> String {
        format!("user:{id}")
    }

    /// Get a user, cache first.
    pub async fn get_user(&self, id: u64) -> Result<Arc<User>, DirectoryError> {
        let key = Self::cache_key(id);

        if let Some(user) = self.cache.get(&key) {
            debug!(id, "User found in cache");
            return Ok(user);
        }

        let user = Arc::new(self.directory.fetch(id).await?);
        self.cache.insert(key, Arc::clone(&user));
        Ok(user)
    }

    pub fn cache(&self) -> &TypedCache<String, Arc<User>> {
        &self.cache
    }
}

/// Summary of a load run.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub requests: u64,
    pub directory_lookups: u64,
    pub cache_size: usize,
    pub cache_capacity: usize,
    pub stats: CacheStats,
    pub hit_rate: f64,
}

/// Deterministic spread of ids over `1..=user_space`, skewed towards low ids
/// so that some users are hot.
fn pick_user(worker: usize, request: usize, user_space: u64) -> u64 {
    let seed = (worker as u64)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add((request as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9));
    let mixed = seed ^ (seed >> 31);
    let space = user_space.max(1);
    if mixed % 4 == 0 {
        mixed % space + 1
    } else {
        mixed % space.div_ceil(8) + 1
    }
}

/// Hammer `service` with `config.workers` concurrent tasks.
///
/// # Errors
/// Fails if a task panics, a lookup fails, or the cache is left inconsistent.
pub async fn run_load(service: Arc<UserService>, config: &Config) -> anyhow::Result<LoadReport> {
    info!(
        workers = config.workers,
        requests_per_worker = config.requests_per_worker,
        user_space = config.user_space,
        "Starting load run"
    );

    let tasks = (0..config.workers).map(|worker| {
        let service = Arc::clone(&service);
        let requests = config.requests_per_worker;
        let user_space = config.user_space;
        tokio::spawn(async move {
            for request in 0..requests {
                let id = pick_user(worker, request, user_space);
                let user = service.get_user(id).await?;
                debug_assert_eq!(user.id, id);
            }
            Ok::<_, DirectoryError>(())
        })
    });

    for result in join_all(tasks).await {
        result.context("load task panicked")??;
    }

    let cache = service.cache();
    cache
        .check_invariants()
        .context("cache invariants violated after load run")?;

    let stats = cache.stats();
    let report = LoadReport {
        requests: (config.workers * config.requests_per_worker) as u64,
        directory_lookups: service.directory.lookups(),
        cache_size: cache.entry_count(),
        cache_capacity: cache.capacity(),
        stats,
        hit_rate: stats.hit_rate(),
    };
    info!(
        hits = stats.hits,
        misses = stats.misses,
        evictions = stats.evictions,
        "Load run finished"
    );
    Ok(report)
}
