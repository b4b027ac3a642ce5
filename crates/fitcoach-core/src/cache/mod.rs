//! Cache layer — the [`CacheStore`] capability and its implementations.
//!
//! The cache is an optional accelerator, never a source of truth: every
//! caller treats a store error the same as a miss, and a deployment without
//! any cache at all (the [`NoopCache`]) is fully supported.

mod redis_store;
mod store;

pub use redis_store::RedisCache;
pub use store::{CacheError, CacheStore, MemoryCache, NoopCache};

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::schema::CacheConfig;

/// Build the cache store for a deployment.
///
/// A configured Redis URL yields a [`RedisCache`]; no URL — or a failed
/// connection — yields a [`NoopCache`]. Cache unavailability must never stop
/// the service from starting.
pub async fn store_from_config(config: &CacheConfig) -> Arc<dyn CacheStore> {
    match config.url.as_deref() {
        Some(url) => match RedisCache::connect(url).await {
            Ok(cache) => {
                info!(url, "Connected to Redis cache");
                Arc::new(cache)
            }
            Err(e) => {
                warn!(url, error = %e, "Redis unavailable, running without cache");
                Arc::new(NoopCache)
            }
        },
        None => {
            info!("No cache configured, running without cache");
            Arc::new(NoopCache)
        }
    }
}
