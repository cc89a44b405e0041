//! Service-level operations
//!
//! Every operation validates its input, consults the cache, and falls back
//! to the indexer or the document store on a miss. Paginated results are
//! registered in the page-set registry so that mutations can sweep them.

pub mod accounting;
pub mod domain;
pub mod project;
pub mod statistics;
pub mod sync;
pub mod users;

pub use accounting::AccountingService;
pub use domain::{DomainProbe, HttpDomainProbe};
pub use project::ProjectService;
pub use statistics::StatisticService;
pub use sync::{SyncReport, SyncService};
pub use users::UserService;

use crate::cache::{Cache, CacheError, PageSetRegistry, ScopeKey};
use crate::db::StoreError;
use crate::indexer::IndexerError;
use crate::models::{FavoritesPage, Page};
use crate::validation::ValidationError;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error(transparent)]
    InvalidParameter(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl From<IndexerError> for ServiceError {
    fn from(err: IndexerError) -> Self {
        ServiceError::UpstreamUnavailable(err.to_string())
    }
}

impl From<CacheError> for ServiceError {
    fn from(err: CacheError) -> Self {
        ServiceError::UpstreamUnavailable(err.to_string())
    }
}

/// Wall-clock seconds since the epoch
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

/// Results that can be stored as a tracked page
pub trait PageLike: Serialize + DeserializeOwned {
    fn item_count(&self) -> usize;
}

impl<T: Serialize + DeserializeOwned> PageLike for Page<T> {
    fn item_count(&self) -> usize {
        self.items.len()
    }
}

impl PageLike for FavoritesPage {
    fn item_count(&self) -> usize {
        self.project_ids.len()
    }
}

/// Cache-aside for a paginated query.
/// Only pages with at least one item are stored and registered under `scope`.
pub(crate) async fn cached_page<P, F, Fut>(
    cache: &Cache,
    pages: &PageSetRegistry,
    scope: &ScopeKey,
    key: &str,
    fetch: F,
) -> Result<P, ServiceError>
where
    P: PageLike,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<P, ServiceError>>,
{
    if let Some(page) = cache.get::<P>(key).await? {
        return Ok(page);
    }

    let page = fetch().await?;

    if page.item_count() > 0 {
        cache.set(key, &page, pages.ttl()).await?;
        pages.register_page(scope, key).await?;
    } else {
        debug!("Not caching empty page for {}", scope);
    }

    Ok(page)
}
