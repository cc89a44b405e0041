//! Project projections: reconciliation with the indexer and local fields
//!
//! `reconcile` is the only path that writes chain-tracked fields. Its steps
//! run strictly in order: read local, fetch authoritative, merge by
//! watermark, persist if changed. Local mutations first make sure the
//! projection exists, then touch only their own columns.

use crate::cache::{fingerprint, Cache, CacheKey, KeyPart, PageSetRegistry, Purpose, ScopeKey};
use crate::config::Config;
use crate::db::{ProjectStore, StoreError};
use crate::indexer::Indexer;
use crate::models::{DomainChallenge, Page, ProjectRecord, ProjectSnapshot, ProjectView};
use crate::service::domain::{challenge_token, normalize_domain, DomainProbe};
use crate::service::{cached_page, ServiceError};
use crate::validation::{validate_address, validate_chain_id, validate_cursor, validate_limit, ValidationError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const MAX_CATEGORIES: usize = 8;
const MAX_CATEGORY_LEN: usize = 32;

#[derive(Clone)]
pub struct ProjectService {
    config: Arc<Config>,
    store: Arc<dyn ProjectStore>,
    indexer: Arc<dyn Indexer>,
    cache: Cache,
    pages: PageSetRegistry,
    domain_probe: Arc<dyn DomainProbe>,
}

impl ProjectService {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn ProjectStore>,
        indexer: Arc<dyn Indexer>,
        cache: Cache,
        pages: PageSetRegistry,
        domain_probe: Arc<dyn DomainProbe>,
    ) -> Self {
        Self {
            config,
            store,
            indexer,
            cache,
            pages,
            domain_probe,
        }
    }

    /// Bring the local projection in line with the indexer and return it
    pub async fn reconcile(&self, chain_id: u64, project_id: u64) -> Result<ProjectRecord, ServiceError> {
        validate_chain_id(chain_id, &self.config.supported_chains)?;

        // Local projection first
        let existing = self.store.find_project(chain_id, project_id).await?;

        // Authoritative state; a failed fetch aborts before any write
        let snapshot = self
            .indexer
            .fetch_project(chain_id, project_id)
            .await?
            .ok_or_else(|| not_found(chain_id, project_id))?;

        let record = match existing {
            Some(record) => self.merge_and_persist(record, &snapshot).await?,
            None => self.create_projection(&snapshot).await?,
        };

        self.sync_owner_index(&record).await?;
        Ok(record)
    }

    async fn merge_and_persist(
        &self,
        mut record: ProjectRecord,
        snapshot: &ProjectSnapshot,
    ) -> Result<ProjectRecord, ServiceError> {
        let previous_watermark = record.chain_update_timestamp;

        if !record.merge_chain_state(snapshot) {
            debug!(
                "Project {}:{} up to date at watermark {}",
                record.chain_id, record.project_id, record.chain_update_timestamp
            );
            return Ok(record);
        }

        if self.store.update_chain_state(&record).await? {
            self.invalidate_detail(record.chain_id, record.project_id).await?;
            info!(
                "Reconciled project {}:{}, watermark {} -> {}",
                record.chain_id, record.project_id, previous_watermark, record.chain_update_timestamp
            );
            return Ok(record);
        }

        // A concurrent reconcile stored a newer watermark first; its row wins
        let stored = self
            .store
            .find_project(record.chain_id, record.project_id)
            .await?
            .ok_or_else(|| {
                StoreError::Corrupt(format!(
                    "project {}:{} vanished during reconcile",
                    record.chain_id, record.project_id
                ))
            })?;
        debug!(
            "Project {}:{} already at watermark {}, skipped {}",
            stored.chain_id, stored.project_id, stored.chain_update_timestamp, record.chain_update_timestamp
        );
        Ok(stored)
    }

    async fn create_projection(&self, snapshot: &ProjectSnapshot) -> Result<ProjectRecord, ServiceError> {
        let mut record = ProjectRecord::seeded(snapshot);
        record.merge_chain_state(snapshot);

        match self.store.insert_project(&record).await {
            Ok(()) => {
                info!(
                    "Created projection for project {}:{} at watermark {}",
                    record.chain_id, record.project_id, record.chain_update_timestamp
                );
                Ok(record)
            }
            Err(StoreError::AlreadyExists) => {
                // A concurrent reconcile created it first; continue from its row
                warn!(
                    "Projection for {}:{} created concurrently, re-reading",
                    record.chain_id, record.project_id
                );
                let existing = self
                    .store
                    .find_project(record.chain_id, record.project_id)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::Storage(StoreError::Corrupt(format!(
                            "project {}:{} vanished after conflicting insert",
                            record.chain_id, record.project_id
                        )))
                    })?;
                self.merge_and_persist(existing, snapshot).await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Keep the owner side-index current; an ownership change evicts the
    /// owned-project pages of both the previous and the new owner
    async fn sync_owner_index(&self, record: &ProjectRecord) -> Result<(), ServiceError> {
        if record.owner.is_empty() {
            return Ok(());
        }

        let key = CacheKey::project_owner(record.chain_id, record.project_id).to_string();
        let previous: Option<String> = self.cache.get(&key).await?;
        if previous.as_deref() == Some(record.owner.as_str()) {
            return Ok(());
        }

        if let Some(previous) = &previous {
            info!(
                "Ownership of {}:{} moved from {} to {}",
                record.chain_id, record.project_id, previous, record.owner
            );
            self.pages
                .invalidate_scope(&ScopeKey::user(record.chain_id, previous, Purpose::OwnedProjects))
                .await?;
        }
        self.pages
            .invalidate_scope(&ScopeKey::user(record.chain_id, &record.owner, Purpose::OwnedProjects))
            .await?;

        self.cache.set(&key, &record.owner, Duration::ZERO).await?;
        Ok(())
    }

    /// Cached, reconciled detail view of a project
    pub async fn get_project(&self, chain_id: u64, project_id: u64) -> Result<ProjectView, ServiceError> {
        validate_chain_id(chain_id, &self.config.supported_chains)?;

        let key = CacheKey::project_detail(chain_id, project_id).to_string();
        if let Some(view) = self.cache.get::<ProjectView>(&key).await? {
            return Ok(view);
        }

        let view = ProjectView::from(self.reconcile(chain_id, project_id).await?);
        self.cache.set(&key, &view, self.config.detail_ttl).await?;
        Ok(view)
    }

    pub async fn invalidate_detail(&self, chain_id: u64, project_id: u64) -> Result<(), ServiceError> {
        let key = CacheKey::project_detail(chain_id, project_id).to_string();
        self.cache.del(&key).await?;
        Ok(())
    }

    pub async fn set_avatar(&self, chain_id: u64, project_id: u64, avatar_url: &str) -> Result<ProjectView, ServiceError> {
        let avatar_url = avatar_url.trim();
        if !(avatar_url.starts_with("https://") || avatar_url.starts_with("http://")) {
            return Err(ValidationError::InvalidParameter("avatar url must be http(s)".to_string()).into());
        }

        self.reconcile(chain_id, project_id).await?;
        self.store.set_avatar(chain_id, project_id, avatar_url).await?;
        info!("Updated avatar of project {}:{}", chain_id, project_id);
        self.reload_view(chain_id, project_id).await
    }

    pub async fn set_categories(
        &self,
        chain_id: u64,
        project_id: u64,
        categories: &[String],
    ) -> Result<ProjectView, ServiceError> {
        let categories = normalize_categories(categories)?;

        self.reconcile(chain_id, project_id).await?;
        self.store.set_categories(chain_id, project_id, &categories).await?;
        info!("Updated categories of project {}:{}: {:?}", chain_id, project_id, categories);
        self.reload_view(chain_id, project_id).await
    }

    /// Start verification of a website domain; returns the token to publish
    pub async fn request_domain_verification(
        &self,
        chain_id: u64,
        project_id: u64,
        domain: &str,
    ) -> Result<DomainChallenge, ServiceError> {
        let domain = normalize_domain(domain)
            .ok_or_else(|| ValidationError::InvalidParameter(format!("invalid domain: {}", domain)))?;

        self.reconcile(chain_id, project_id).await?;

        let token = challenge_token(chain_id, project_id, &domain);
        self.store
            .set_domain_challenge(chain_id, project_id, &domain, &token)
            .await?;
        self.invalidate_detail(chain_id, project_id).await?;

        info!("Issued domain challenge for {} on project {}:{}", domain, chain_id, project_id);
        Ok(DomainChallenge { domain, token })
    }

    /// Check the pending domain challenge and record the outcome
    pub async fn confirm_domain_verification(&self, chain_id: u64, project_id: u64) -> Result<ProjectView, ServiceError> {
        validate_chain_id(chain_id, &self.config.supported_chains)?;

        let record = self
            .store
            .find_project(chain_id, project_id)
            .await?
            .ok_or_else(|| not_found(chain_id, project_id))?;

        let (domain, token) = match (&record.domain, &record.domain_token) {
            (Some(domain), Some(token)) => (domain.clone(), token.clone()),
            _ => {
                return Err(ValidationError::InvalidParameter(
                    "no pending domain verification".to_string(),
                )
                .into())
            }
        };

        let verified = self.domain_probe.serves_token(&domain, &token).await?;
        self.store.set_domain_verified(chain_id, project_id, verified).await?;
        info!("Domain {} for project {}:{} verified: {}", domain, chain_id, project_id, verified);

        self.reload_view(chain_id, project_id).await
    }

    /// Projects owned by `owner`, one indexer page at a time
    pub async fn get_owned_projects(
        &self,
        chain_id: u64,
        owner: &str,
        cursor: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Page<ProjectSnapshot>, ServiceError> {
        let chain_id = validate_chain_id(chain_id, &self.config.supported_chains)?;
        let owner = validate_address(owner)?;
        let cursor = validate_cursor(cursor)?;
        let limit = validate_limit(limit, self.config.page_limit_max)?;

        let scope = ScopeKey::user(chain_id, &owner, Purpose::OwnedProjects);
        let key = fingerprint(
            "owned-projects",
            &[
                KeyPart::Uint(chain_id),
                KeyPart::Address(&owner),
                KeyPart::Cursor(cursor.as_deref()),
                KeyPart::Uint(limit as u64),
            ],
        );

        cached_page(&self.cache, &self.pages, &scope, &key, || async {
            Ok::<_, ServiceError>(self
                .indexer
                .fetch_owned_projects(chain_id, &owner, cursor.as_deref(), limit)
                .await?)
        })
        .await
    }

    async fn reload_view(&self, chain_id: u64, project_id: u64) -> Result<ProjectView, ServiceError> {
        self.invalidate_detail(chain_id, project_id).await?;
        let record = self
            .store
            .find_project(chain_id, project_id)
            .await?
            .ok_or_else(|| not_found(chain_id, project_id))?;
        Ok(record.into())
    }
}

fn not_found(chain_id: u64, project_id: u64) -> ServiceError {
    ServiceError::NotFound(format!("project {} on chain {}", project_id, chain_id))
}

fn normalize_categories(raw: &[String]) -> Result<Vec<String>, ValidationError> {
    let mut categories: Vec<String> = Vec::with_capacity(raw.len());
    for category in raw {
        let category = category.trim().to_lowercase();
        if category.is_empty() || category.len() > MAX_CATEGORY_LEN {
            return Err(ValidationError::InvalidParameter(format!(
                "category must be 1..={} characters",
                MAX_CATEGORY_LEN
            )));
        }
        if !categories.contains(&category) {
            categories.push(category);
        }
    }

    if categories.len() > MAX_CATEGORIES {
        return Err(ValidationError::InvalidParameter(format!(
            "at most {} categories",
            MAX_CATEGORIES
        )));
    }
    Ok(categories)
}
