use crate::cache::{fingerprint, Cache, KeyPart, PageSetRegistry, Purpose, ScopeKey};
use crate::config::Config;
use crate::db::FavoriteStore;
use crate::indexer::Indexer;
use crate::models::{FavoritesPage, Page, ProjectUser, Purchase};
use crate::service::{cached_page, ProjectService, ServiceError};
use crate::validation::{
    validate_address, validate_chain_id, validate_cursor, validate_limit, validate_page,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Whether a 1-indexed page can hold any of `count` items.
/// Kept in this exact form; see the boundary tests.
pub fn is_page_requestable(page: u32, limit: u32, count: u64) -> bool {
    // Wide enough that no u32 x u32 product or u64 count can overflow
    let (page, limit, count) = (page as i128, limit as i128, count as i128);
    limit - (page * limit - count) > 0
}

#[derive(Clone)]
pub struct UserService {
    config: Arc<Config>,
    indexer: Arc<dyn Indexer>,
    favorites: Arc<dyn FavoriteStore>,
    projects: ProjectService,
    cache: Cache,
    pages: PageSetRegistry,
}

impl UserService {
    pub fn new(
        config: Arc<Config>,
        indexer: Arc<dyn Indexer>,
        favorites: Arc<dyn FavoriteStore>,
        projects: ProjectService,
        cache: Cache,
        pages: PageSetRegistry,
    ) -> Self {
        Self {
            config,
            indexer,
            favorites,
            projects,
            cache,
            pages,
        }
    }

    /// Users holding or having held access to a project
    pub async fn get_project_users(
        &self,
        chain_id: u64,
        project_id: u64,
        cursor: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Page<ProjectUser>, ServiceError> {
        let chain_id = validate_chain_id(chain_id, &self.config.supported_chains)?;
        let cursor = validate_cursor(cursor)?;
        let limit = validate_limit(limit, self.config.page_limit_max)?;

        let scope = ScopeKey::project(chain_id, project_id, Purpose::Users);
        let key = fingerprint(
            "project-user",
            &[
                KeyPart::Uint(chain_id),
                KeyPart::Uint(project_id),
                KeyPart::Cursor(cursor.as_deref()),
                KeyPart::Uint(limit as u64),
            ],
        );

        cached_page(&self.cache, &self.pages, &scope, &key, || async {
            Ok::<_, ServiceError>(self
                .indexer
                .fetch_project_users(chain_id, project_id, cursor.as_deref(), limit)
                .await?)
        })
        .await
    }

    /// Purchase history of a user across projects
    pub async fn get_user_purchases(
        &self,
        chain_id: u64,
        user: &str,
        cursor: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Page<Purchase>, ServiceError> {
        let chain_id = validate_chain_id(chain_id, &self.config.supported_chains)?;
        let user = validate_address(user)?;
        let cursor = validate_cursor(cursor)?;
        let limit = validate_limit(limit, self.config.page_limit_max)?;

        let scope = ScopeKey::user(chain_id, &user, Purpose::Purchases);
        let key = fingerprint(
            "user-purchase",
            &[
                KeyPart::Uint(chain_id),
                KeyPart::Address(&user),
                KeyPart::Cursor(cursor.as_deref()),
                KeyPart::Uint(limit as u64),
            ],
        );

        cached_page(&self.cache, &self.pages, &scope, &key, || async {
            Ok::<_, ServiceError>(self
                .indexer
                .fetch_user_purchases(chain_id, &user, cursor.as_deref(), limit)
                .await?)
        })
        .await
    }

    /// Mark a project as favorite; the project must exist upstream
    pub async fn add_favorite(&self, chain_id: u64, user: &str, project_id: u64) -> Result<bool, ServiceError> {
        let chain_id = validate_chain_id(chain_id, &self.config.supported_chains)?;
        let user = validate_address(user)?;

        self.projects.reconcile(chain_id, project_id).await?;

        let added = self.favorites.add_favorite(chain_id, &user, project_id).await?;
        if added {
            self.pages
                .invalidate_scope(&ScopeKey::user(chain_id, &user, Purpose::Favorites))
                .await?;
            info!("User {} favorited project {}:{}", user, chain_id, project_id);
        }
        Ok(added)
    }

    pub async fn remove_favorite(&self, chain_id: u64, user: &str, project_id: u64) -> Result<bool, ServiceError> {
        let chain_id = validate_chain_id(chain_id, &self.config.supported_chains)?;
        let user = validate_address(user)?;

        let removed = self.favorites.remove_favorite(chain_id, &user, project_id).await?;
        if removed {
            self.pages
                .invalidate_scope(&ScopeKey::user(chain_id, &user, Purpose::Favorites))
                .await?;
            info!("User {} unfavorited project {}:{}", user, chain_id, project_id);
        }
        Ok(removed)
    }

    /// Favorites of a user, newest first, with 1-indexed pages
    pub async fn get_favorites(
        &self,
        chain_id: u64,
        user: &str,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<FavoritesPage, ServiceError> {
        let chain_id = validate_chain_id(chain_id, &self.config.supported_chains)?;
        let user = validate_address(user)?;
        let page = validate_page(page)?;
        let limit = validate_limit(limit, self.config.page_limit_max)?;

        let scope = ScopeKey::user(chain_id, &user, Purpose::Favorites);
        let key = fingerprint(
            "user-favorite",
            &[
                KeyPart::Uint(chain_id),
                KeyPart::Address(&user),
                KeyPart::Uint(page as u64),
                KeyPart::Uint(limit as u64),
            ],
        );

        cached_page(&self.cache, &self.pages, &scope, &key, || async {
            let total = self.favorites.count_favorites(chain_id, &user).await?;

            // Pages past the end are answered without touching the list query
            let project_ids = if is_page_requestable(page, limit, total) {
                let offset = (page as u64 - 1) * limit as u64;
                self.favorites
                    .list_favorites(chain_id, &user, offset, limit as u64)
                    .await?
            } else {
                debug!("Favorites page {} of {} beyond {} items", page, user, total);
                Vec::new()
            };

            Ok::<_, ServiceError>(FavoritesPage {
                project_ids,
                total,
                page,
                limit,
            })
        })
        .await
    }
}
