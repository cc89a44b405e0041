use crate::config::Config;
use crate::indexer::{queries, Indexer, IndexerError, TimeSeriesQuery};
use crate::models::{IncomeRecord, Page, ProjectSnapshot, ProjectUser, Purchase, StatisticPoint};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    end_cursor: Option<String>,
    has_next_page: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection<T> {
    items: Vec<T>,
    page_info: PageInfo,
}

impl<T> From<Connection<T>> for Page<T> {
    fn from(conn: Connection<T>) -> Self {
        let next_cursor = if conn.page_info.has_next_page {
            conn.page_info.end_cursor
        } else {
            None
        };
        Page {
            items: conn.items,
            next_cursor,
        }
    }
}

/// Indexer client speaking GraphQL over HTTP
pub struct GraphqlIndexer {
    http: reqwest::Client,
    url: String,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl GraphqlIndexer {
    pub fn new(config: &Config) -> Result<Self, IndexerError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.indexer_timeout_secs))
            .build()?;

        let limiter = config
            .indexer_rate_limit
            .and_then(NonZeroU32::new)
            .map(|per_second| RateLimiter::direct(Quota::per_second(per_second)));

        info!(
            "Initializing indexer client with endpoint: {}, rate limit: {:?}",
            config.indexer_url, config.indexer_rate_limit
        );

        Ok(Self {
            http,
            url: config.indexer_url.clone(),
            limiter,
        })
    }

    /// Post a GraphQL document and extract `data.<field>`
    async fn query<T: DeserializeOwned>(&self, document: &str, field: &str, variables: Value) -> Result<T, IndexerError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let body = json!({ "query": document, "variables": variables });

        // Retry transport failures and 5xx; anything else is final
        let response = (|| async {
            self.http
                .post(&self.url)
                .json(&body)
                .send()
                .await?
                .error_for_status()
        })
        .retry(ExponentialBuilder::default().with_max_times(3))
        .when(|e: &reqwest::Error| {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        })
        .notify(|e: &reqwest::Error, after: Duration| {
            warn!("Indexer request failed: {}, retrying after {:?}", e, after);
        })
        .await?;

        let parsed: GraphqlResponse<Value> = response.json().await?;

        if let Some(errors) = parsed.errors.filter(|errs| !errs.is_empty()) {
            let message = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(IndexerError::Graphql(message));
        }

        let mut data = parsed.data.ok_or(IndexerError::MissingData)?;
        let value = data.get_mut(field).map(Value::take).unwrap_or(Value::Null);
        debug!("Indexer answered {} query", field);
        serde_json::from_value(value).map_err(|e| IndexerError::Decode(format!("{}: {}", field, e)))
    }
}

#[async_trait]
impl Indexer for GraphqlIndexer {
    async fn fetch_project(&self, chain_id: u64, project_id: u64) -> Result<Option<ProjectSnapshot>, IndexerError> {
        let variables = json!({
            "chainId": chain_id.to_string(),
            "projectId": project_id.to_string(),
        });
        let project: Option<ProjectSnapshot> = self.query(&queries::project(), "project", variables).await?;

        Ok(project.map(|mut p| {
            p.chain_id = chain_id;
            p
        }))
    }

    async fn fetch_time_series(&self, query: &TimeSeriesQuery) -> Result<Vec<StatisticPoint>, IndexerError> {
        let variables = json!({
            "chainId": query.chain_id.to_string(),
            "projectId": query.project_id.to_string(),
            "tick": query.tick.to_string(),
            "type": query.type_code,
            "subType": query.sub_type_code,
            "timeGap": query.time_gap.to_string(),
            "paymentMethod": query.payment_method,
        });
        self.query(queries::TIME_SERIES, "statistics", variables).await
    }

    async fn fetch_project_incomes(
        &self,
        chain_id: u64,
        project_id: u64,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<IncomeRecord>, IndexerError> {
        let variables = json!({
            "chainId": chain_id.to_string(),
            "projectId": project_id.to_string(),
            "after": cursor,
            "first": limit,
        });
        let conn: Connection<IncomeRecord> = self.query(queries::PROJECT_INCOMES, "projectIncomes", variables).await?;
        Ok(conn.into())
    }

    async fn fetch_project_users(
        &self,
        chain_id: u64,
        project_id: u64,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<ProjectUser>, IndexerError> {
        let variables = json!({
            "chainId": chain_id.to_string(),
            "projectId": project_id.to_string(),
            "after": cursor,
            "first": limit,
        });
        let conn: Connection<ProjectUser> = self.query(queries::PROJECT_USERS, "projectUsers", variables).await?;
        Ok(conn.into())
    }

    async fn fetch_user_purchases(
        &self,
        chain_id: u64,
        user: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<Purchase>, IndexerError> {
        let variables = json!({
            "chainId": chain_id.to_string(),
            "user": user,
            "after": cursor,
            "first": limit,
        });
        let conn: Connection<Purchase> = self.query(queries::USER_PURCHASES, "userPurchases", variables).await?;
        Ok(conn.into())
    }

    async fn fetch_owned_projects(
        &self,
        chain_id: u64,
        owner: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<ProjectSnapshot>, IndexerError> {
        let variables = json!({
            "chainId": chain_id.to_string(),
            "owner": owner,
            "after": cursor,
            "first": limit,
        });
        let conn: Connection<ProjectSnapshot> =
            self.query(&queries::owned_projects(), "ownedProjects", variables).await?;

        let mut page: Page<ProjectSnapshot> = conn.into();
        for project in &mut page.items {
            project.chain_id = chain_id;
        }
        Ok(page)
    }
}
