use crate::cache::{fingerprint, Cache, KeyPart, PageSetRegistry, Purpose, ScopeKey};
use crate::config::Config;
use crate::indexer::Indexer;
use crate::models::{IncomeRecord, Page};
use crate::service::{cached_page, ServiceError, StatisticService};
use crate::validation::{validate_address, validate_chain_id, validate_cursor, validate_limit};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AccountingService {
    config: Arc<Config>,
    indexer: Arc<dyn Indexer>,
    cache: Cache,
    pages: PageSetRegistry,
    statistics: StatisticService,
}

impl AccountingService {
    pub fn new(
        config: Arc<Config>,
        indexer: Arc<dyn Indexer>,
        cache: Cache,
        pages: PageSetRegistry,
        statistics: StatisticService,
    ) -> Self {
        Self {
            config,
            indexer,
            cache,
            pages,
            statistics,
        }
    }

    /// One page of a project's income records
    pub async fn get_project_incomes(
        &self,
        chain_id: u64,
        project_id: u64,
        cursor: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Page<IncomeRecord>, ServiceError> {
        let chain_id = validate_chain_id(chain_id, &self.config.supported_chains)?;
        let cursor = validate_cursor(cursor)?;
        let limit = validate_limit(limit, self.config.page_limit_max)?;

        let scope = ScopeKey::project(chain_id, project_id, Purpose::Income);
        let key = fingerprint(
            "project-income",
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
                .fetch_project_incomes(chain_id, project_id, cursor.as_deref(), limit)
                .await?)
        })
        .await
    }

    /// A purchase landed on chain: drop everything derived from the
    /// project's sales and the buyer's history. Returns the number of
    /// cache entries swept.
    pub async fn record_purchase(&self, chain_id: u64, project_id: u64, buyer: &str) -> Result<usize, ServiceError> {
        let chain_id = validate_chain_id(chain_id, &self.config.supported_chains)?;
        let buyer = validate_address(buyer)?;

        let mut swept = 0;
        for scope in [
            ScopeKey::project(chain_id, project_id, Purpose::Income),
            ScopeKey::project(chain_id, project_id, Purpose::Users),
            ScopeKey::user(chain_id, &buyer, Purpose::Purchases),
        ] {
            swept += self.pages.invalidate_scope(&scope).await?;
        }
        swept += self.statistics.remove_project_statistics(chain_id, project_id).await?;

        info!(
            "Purchase by {} on project {}:{} swept {} cache entries",
            buyer, chain_id, project_id, swept
        );
        Ok(swept)
    }
}
