use crate::cache::{Cache, PageSetRegistry};
use crate::config::Config;
use crate::db::{FavoriteStore, ProjectStore};
use crate::indexer::Indexer;
use crate::service::{
    AccountingService, Clock, DomainProbe, ProjectService, StatisticService, SyncService, UserService,
};
use std::sync::Arc;

/// Collaborators every service is built from
pub struct Dependencies {
    pub projects: Arc<dyn ProjectStore>,
    pub favorites: Arc<dyn FavoriteStore>,
    pub indexer: Arc<dyn Indexer>,
    pub cache: Cache,
    pub clock: Arc<dyn Clock>,
    pub domain_probe: Arc<dyn DomainProbe>,
}

pub struct AppState {
    pub config: Arc<Config>,
    pub projects: ProjectService,
    pub accounting: AccountingService,
    pub users: UserService,
    pub statistics: StatisticService,
    pub sync: SyncService,
}

impl AppState {
    pub fn new(config: Config, deps: Dependencies) -> Self {
        let config = Arc::new(config);
        let pages = PageSetRegistry::new(deps.cache.clone(), config.page_ttl);

        let projects = ProjectService::new(
            config.clone(),
            deps.projects.clone(),
            deps.indexer.clone(),
            deps.cache.clone(),
            pages.clone(),
            deps.domain_probe,
        );
        let statistics = StatisticService::new(
            config.clone(),
            deps.indexer.clone(),
            deps.cache.clone(),
            deps.clock,
        );
        let accounting = AccountingService::new(
            config.clone(),
            deps.indexer.clone(),
            deps.cache.clone(),
            pages.clone(),
            statistics.clone(),
        );
        let users = UserService::new(
            config.clone(),
            deps.indexer,
            deps.favorites,
            projects.clone(),
            deps.cache,
            pages,
        );
        let sync = SyncService::new(deps.projects, projects.clone(), config.sync_concurrency);

        Self {
            config,
            projects,
            accounting,
            users,
            statistics,
            sync,
        }
    }
}
