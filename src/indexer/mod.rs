//! Authoritative source: the chain indexer
//!
//! The indexer applies chain and entity filters server side; results are
//! used as returned.

pub mod client;
pub mod queries;

pub use client::GraphqlIndexer;

use crate::models::{IncomeRecord, Page, ProjectSnapshot, ProjectUser, Purchase, StatisticPoint};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Indexer request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Indexer returned errors: {0}")]
    Graphql(String),

    #[error("Indexer response missing data")]
    MissingData,

    #[error("Could not decode indexer response: {0}")]
    Decode(String),
}

/// Parameters of a statistic time-series lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeriesQuery {
    pub chain_id: u64,
    pub project_id: u64,
    /// Index of the bucket in progress; the series ends at or before it
    pub tick: u64,
    pub type_code: u16,
    pub sub_type_code: u16,
    pub payment_method: Option<String>,
    pub time_gap: u64,
}

#[async_trait]
pub trait Indexer: Send + Sync {
    /// `None` when the indexer knows no such project
    async fn fetch_project(&self, chain_id: u64, project_id: u64) -> Result<Option<ProjectSnapshot>, IndexerError>;

    /// Buckets ordered by time index; missing buckets are simply absent
    async fn fetch_time_series(&self, query: &TimeSeriesQuery) -> Result<Vec<StatisticPoint>, IndexerError>;

    async fn fetch_project_incomes(
        &self,
        chain_id: u64,
        project_id: u64,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<IncomeRecord>, IndexerError>;

    async fn fetch_project_users(
        &self,
        chain_id: u64,
        project_id: u64,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<ProjectUser>, IndexerError>;

    async fn fetch_user_purchases(
        &self,
        chain_id: u64,
        user: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<Purchase>, IndexerError>;

    async fn fetch_owned_projects(
        &self,
        chain_id: u64,
        owner: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<ProjectSnapshot>, IndexerError>;
}
