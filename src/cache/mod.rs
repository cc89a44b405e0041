pub mod keys;
pub mod memory;
pub mod pages;
pub mod redis_store;
pub mod statistic_key;
pub mod store;

pub use keys::{fingerprint, CacheKey, KeyPart, Purpose, ScopeKey};
pub use memory::MemoryCacheStore;
pub use pages::PageSetRegistry;
pub use redis_store::RedisCacheStore;
pub use statistic_key::{Statistic, TimeGap, UserMetric};
pub use store::{CacheError, CacheStore};

use crate::config::{CacheBackend, Config};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Typed get/set/delete over whichever store backs the cache
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.store.get(key).await? {
            Some(value) => {
                debug!("Cache hit for key: {}", key);
                Ok(Some(serde_json::from_value(value)?))
            }
            None => {
                debug!("Cache miss for key: {}", key);
                Ok(None)
            }
        }
    }

    /// A zero `ttl` stores the value until it is deleted
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), CacheError> {
        let value = serde_json::to_value(value)?;
        self.store.set(key, value, ttl).await?;
        debug!("Cached value for key {} with TTL: {:?}", key, ttl);
        Ok(())
    }

    pub async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.store.del(key).await?;
        debug!("Invalidated cache key: {}", key);
        Ok(())
    }
}

/// Build the configured cache backend
pub async fn init_cache(config: &Config) -> Result<Cache, CacheError> {
    let store: Arc<dyn CacheStore> = match config.cache_backend {
        CacheBackend::Memory => {
            info!("Using in-memory cache with capacity: {}", config.cache_max_capacity);
            Arc::new(MemoryCacheStore::new(config.cache_max_capacity))
        }
        CacheBackend::Redis => Arc::new(RedisCacheStore::connect(&config.redis_url).await?),
    };
    Ok(Cache::new(store))
}
