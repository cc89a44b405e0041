//! Shared fixtures: a scripted indexer, a fixed clock and an in-memory stack

use crate::{
    cache::{Cache, MemoryCacheStore, PageSetRegistry},
    config::Config,
    db::{connection, SqliteStore},
    indexer::{Indexer, IndexerError, TimeSeriesQuery},
    models::{IncomeRecord, Page, ProjectSnapshot, ProjectUser, Purchase, StatisticPoint},
    service::{Clock, DomainProbe, ServiceError},
    state::{AppState, Dependencies},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const CHAIN: u64 = 8453;
pub const OWNER: &str = "0x00000000000000000000000000000000000000a1";
pub const OTHER_OWNER: &str = "0x00000000000000000000000000000000000000b2";
pub const BUYER: &str = "0x00000000000000000000000000000000000000c3";
pub const USDC: &str = "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913";
pub const WETH: &str = "0x4200000000000000000000000000000000000006";

pub fn snapshot(project_id: u64, owner: &str, paused: bool, update_timestamp: u64) -> ProjectSnapshot {
    ProjectSnapshot {
        chain_id: CHAIN,
        project_id,
        address: format!("0x{:040x}", 0x1000 + project_id),
        owner: owner.to_string(),
        paused,
        payment_methods: vec![USDC.to_string()],
        packages: vec![],
        extra_times: vec![],
        update_timestamp,
    }
}

pub fn income(n: u64) -> IncomeRecord {
    IncomeRecord {
        tx_hash: format!("0x{:064x}", n),
        buyer: BUYER.to_string(),
        payment_method: USDC.to_string(),
        amount: (n * 1_000_000).to_string(),
        timestamp: 1_700_000_000 + n,
    }
}

/// Indexer answering from scripted state and counting its calls
#[derive(Default)]
pub struct MockIndexer {
    projects: Mutex<HashMap<(u64, u64), ProjectSnapshot>>,
    incomes: Mutex<Vec<IncomeRecord>>,
    users: Mutex<Vec<ProjectUser>>,
    purchases: Mutex<Vec<Purchase>>,
    series: Mutex<Vec<StatisticPoint>>,
    failing: AtomicBool,
    pub project_calls: AtomicUsize,
    pub page_calls: AtomicUsize,
    pub series_calls: AtomicUsize,
}

impl MockIndexer {
    pub fn set_project(&self, snapshot: ProjectSnapshot) {
        self.projects
            .lock()
            .unwrap()
            .insert((snapshot.chain_id, snapshot.project_id), snapshot);
    }

    pub fn set_incomes(&self, incomes: Vec<IncomeRecord>) {
        *self.incomes.lock().unwrap() = incomes;
    }

    pub fn set_users(&self, users: Vec<ProjectUser>) {
        *self.users.lock().unwrap() = users;
    }

    pub fn set_purchases(&self, purchases: Vec<Purchase>) {
        *self.purchases.lock().unwrap() = purchases;
    }

    pub fn set_series(&self, points: Vec<StatisticPoint>) {
        *self.series.lock().unwrap() = points;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), IndexerError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(IndexerError::Graphql("indexer offline".to_string()));
        }
        Ok(())
    }

    fn page_of<T: Clone>(&self, items: &[T], limit: u32) -> Result<Page<T>, IndexerError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(Page {
            items: items.iter().take(limit as usize).cloned().collect(),
            next_cursor: None,
        })
    }
}

#[async_trait]
impl Indexer for MockIndexer {
    async fn fetch_project(&self, chain_id: u64, project_id: u64) -> Result<Option<ProjectSnapshot>, IndexerError> {
        self.project_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.projects.lock().unwrap().get(&(chain_id, project_id)).cloned())
    }

    async fn fetch_time_series(&self, _query: &TimeSeriesQuery) -> Result<Vec<StatisticPoint>, IndexerError> {
        self.series_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.series.lock().unwrap().clone())
    }

    async fn fetch_project_incomes(
        &self,
        _chain_id: u64,
        _project_id: u64,
        _cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<IncomeRecord>, IndexerError> {
        let items = self.incomes.lock().unwrap().clone();
        self.page_of(&items, limit)
    }

    async fn fetch_project_users(
        &self,
        _chain_id: u64,
        _project_id: u64,
        _cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<ProjectUser>, IndexerError> {
        let items = self.users.lock().unwrap().clone();
        self.page_of(&items, limit)
    }

    async fn fetch_user_purchases(
        &self,
        _chain_id: u64,
        _user: &str,
        _cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<Purchase>, IndexerError> {
        let items = self.purchases.lock().unwrap().clone();
        self.page_of(&items, limit)
    }

    async fn fetch_owned_projects(
        &self,
        chain_id: u64,
        owner: &str,
        _cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<ProjectSnapshot>, IndexerError> {
        let mut owned: Vec<ProjectSnapshot> = self
            .projects
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.chain_id == chain_id && p.owner.eq_ignore_ascii_case(owner))
            .cloned()
            .collect();
        owned.sort_by_key(|p| p.project_id);
        self.page_of(&owned, limit)
    }
}

pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

pub struct NoopProbe {
    pub serves: bool,
}

#[async_trait]
impl DomainProbe for NoopProbe {
    async fn serves_token(&self, _domain: &str, _token: &str) -> Result<bool, ServiceError> {
        Ok(self.serves)
    }
}

pub struct TestStack {
    pub state: AppState,
    pub indexer: Arc<MockIndexer>,
    pub store: Arc<SqliteStore>,
    pub cache: Cache,
}

impl TestStack {
    /// A registry view over the same cache the services use
    pub fn registry(&self) -> PageSetRegistry {
        PageSetRegistry::new(self.cache.clone(), self.state.config.page_ttl)
    }
}

pub fn test_config() -> Config {
    Config {
        payment_methods: vec![USDC.to_string(), WETH.to_string()],
        ..Config::default()
    }
}

/// Fresh in-memory database and cache per test
pub async fn setup() -> TestStack {
    setup_with(test_config(), true).await
}

pub async fn setup_with(config: Config, domain_serves: bool) -> TestStack {
    let pool = connection::establish_connection("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    let store = Arc::new(SqliteStore::new(pool));
    let indexer = Arc::new(MockIndexer::default());
    let cache = Cache::new(Arc::new(MemoryCacheStore::new(1_000)));

    let deps = Dependencies {
        projects: store.clone(),
        favorites: store.clone(),
        indexer: indexer.clone(),
        cache: cache.clone(),
        clock: Arc::new(FixedClock(1_700_000_000)),
        domain_probe: Arc::new(NoopProbe { serves: domain_serves }),
    };

    TestStack {
        state: AppState::new(config, deps),
        indexer,
        store,
        cache,
    }
}
