//! Page-set registry
//!
//! Remembers which fingerprints were cached for each scope so that a change
//! to the underlying resource can evict every derived page at once.

use super::keys::ScopeKey;
use super::store::CacheError;
use super::Cache;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Clone)]
pub struct PageSetRegistry {
    cache: Cache,
    /// Same TTL as the pages being tracked
    ttl: Duration,
}

impl PageSetRegistry {
    pub fn new(cache: Cache, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Record that `page_fingerprint` was cached under `scope`; idempotent
    pub async fn register_page(&self, scope: &ScopeKey, page_fingerprint: &str) -> Result<(), CacheError> {
        let set_key = scope.to_string();
        self.cache
            .store()
            .add_member(&set_key, page_fingerprint, self.ttl)
            .await?;
        debug!("Registered page {} in {}", page_fingerprint, set_key);
        Ok(())
    }

    pub async fn pages(&self, scope: &ScopeKey) -> Result<Vec<String>, CacheError> {
        self.cache.store().members(&scope.to_string()).await
    }

    /// Evict every page registered for `scope`, then the set itself.
    /// Pages that already expired are simply deleted again.
    pub async fn invalidate_scope(&self, scope: &ScopeKey) -> Result<usize, CacheError> {
        let set_key = scope.to_string();
        let pages = self.cache.store().members(&set_key).await?;

        for page in &pages {
            self.cache.del(page).await?;
        }
        self.cache.del(&set_key).await?;

        info!("Invalidated {} cached pages for {}", pages.len(), set_key);
        Ok(pages.len())
    }
}
