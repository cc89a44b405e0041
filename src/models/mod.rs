// Domain models shared by the indexer client, the document store and the API
// - ProjectSnapshot: authoritative project state as reported by the indexer
// - ProjectRecord: local projection with watermark and locally-owned fields
// - Page<T>: cursor-paginated result from the indexer

use serde::{Deserialize, Deserializer, Serialize};

/// Accept integers sent either as JSON numbers or as decimal strings
pub fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberLike {
        Number(u64),
        Text(String),
    }

    match NumberLike::deserialize(deserializer)? {
        NumberLike::Number(n) => Ok(n),
        NumberLike::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPackage {
    pub package_id: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub access_duration: u64,
    pub price: String,
    pub payment_method: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraTimeOffer {
    pub extra_time_id: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub access_duration: u64,
    pub price: String,
    pub payment_method: String,
}

/// Project state as reported by the authoritative source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    /// Not reported by the indexer; filled in from the request
    #[serde(default)]
    pub chain_id: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub project_id: u64,
    pub address: String,
    pub owner: String,
    pub paused: bool,
    pub payment_methods: Vec<String>,
    pub packages: Vec<AccessPackage>,
    pub extra_times: Vec<ExtraTimeOffer>,
    #[serde(deserialize_with = "lenient_u64")]
    pub update_timestamp: u64,
}

/// Document-store mirror of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub chain_id: u64,
    pub project_id: u64,
    pub address: String,
    pub owner: String,
    pub paused: bool,
    pub payment_methods: Vec<String>,
    pub packages: Vec<AccessPackage>,
    pub extra_times: Vec<ExtraTimeOffer>,
    pub chain_update_timestamp: u64,
    pub avatar_url: Option<String>,
    pub categories: Vec<String>,
    pub domain: Option<String>,
    pub domain_token: Option<String>,
    pub domain_verified: bool,
}

impl ProjectRecord {
    /// A fresh projection carrying only the identity of the snapshot.
    /// The watermark starts at zero so the first merge applies chain fields.
    pub fn seeded(snapshot: &ProjectSnapshot) -> Self {
        Self {
            chain_id: snapshot.chain_id,
            project_id: snapshot.project_id,
            address: snapshot.address.to_lowercase(),
            owner: String::new(),
            paused: false,
            payment_methods: Vec::new(),
            packages: Vec::new(),
            extra_times: Vec::new(),
            chain_update_timestamp: 0,
            avatar_url: None,
            categories: Vec::new(),
            domain: None,
            domain_token: None,
            domain_verified: false,
        }
    }

    /// Overwrite chain-tracked fields when the snapshot is strictly newer.
    /// Returns whether anything changed.
    pub fn merge_chain_state(&mut self, snapshot: &ProjectSnapshot) -> bool {
        if snapshot.update_timestamp <= self.chain_update_timestamp {
            return false;
        }

        self.owner = snapshot.owner.to_lowercase();
        self.paused = snapshot.paused;
        self.payment_methods = snapshot
            .payment_methods
            .iter()
            .map(|m| m.to_lowercase())
            .collect();
        self.packages = snapshot.packages.clone();
        self.extra_times = snapshot.extra_times.clone();
        self.chain_update_timestamp = snapshot.update_timestamp;
        true
    }
}

/// What callers see of a project; the pending domain token stays private
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub chain_id: u64,
    pub project_id: u64,
    pub address: String,
    pub owner: String,
    pub paused: bool,
    pub payment_methods: Vec<String>,
    pub packages: Vec<AccessPackage>,
    pub extra_times: Vec<ExtraTimeOffer>,
    pub chain_update_timestamp: u64,
    pub avatar_url: Option<String>,
    pub categories: Vec<String>,
    pub domain: Option<String>,
    pub domain_verified: bool,
}

impl From<ProjectRecord> for ProjectView {
    fn from(record: ProjectRecord) -> Self {
        Self {
            chain_id: record.chain_id,
            project_id: record.project_id,
            address: record.address,
            owner: record.owner,
            paused: record.paused,
            payment_methods: record.payment_methods,
            packages: record.packages,
            extra_times: record.extra_times,
            chain_update_timestamp: record.chain_update_timestamp,
            avatar_url: record.avatar_url,
            categories: record.categories,
            domain: record.domain,
            domain_verified: record.domain_verified,
        }
    }
}

/// A cursor-paginated slice of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRecord {
    pub tx_hash: String,
    pub buyer: String,
    pub payment_method: String,
    pub amount: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUser {
    pub user: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub access_expires_at: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub first_purchase_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub tx_hash: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub project_id: u64,
    pub payment_method: String,
    pub amount: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub access_duration: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub timestamp: u64,
}

/// One bucket of a statistic time series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticPoint {
    pub value: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub time_index: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticSeries {
    pub time_gap: u64,
    /// Bucket index containing "now"; the source does not mark it
    pub current_index: u64,
    pub points: Vec<StatisticPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesPage {
    pub project_ids: Vec<u64>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainChallenge {
    pub domain: String,
    pub token: String,
}
