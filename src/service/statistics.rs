use crate::cache::statistic_key::{project_stat_ids, stat_id};
use crate::cache::{Cache, Statistic, TimeGap};
use crate::config::Config;
use crate::indexer::{Indexer, TimeSeriesQuery};
use crate::models::{StatisticPoint, StatisticSeries};
use crate::service::{Clock, ServiceError};
use crate::validation::validate_chain_id;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct StatisticService {
    config: Arc<Config>,
    indexer: Arc<dyn Indexer>,
    cache: Cache,
    clock: Arc<dyn Clock>,
}

impl StatisticService {
    pub fn new(config: Arc<Config>, indexer: Arc<dyn Indexer>, cache: Cache, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            indexer,
            cache,
            clock,
        }
    }

    /// Time series of one statistic for a project, bucketed by `gap`
    pub async fn get_project_statistics(
        &self,
        chain_id: u64,
        project_id: u64,
        statistic: &Statistic,
        gap: TimeGap,
    ) -> Result<StatisticSeries, ServiceError> {
        validate_chain_id(chain_id, &self.config.supported_chains)?;

        let current_index = gap.bucket_index(self.clock.now());
        let key = stat_id(chain_id, project_id, gap, statistic);

        if let Some(mut series) = self.cache.get::<StatisticSeries>(&key).await? {
            series.current_index = current_index;
            return Ok(series);
        }

        let query = TimeSeriesQuery {
            chain_id,
            project_id,
            tick: current_index,
            type_code: statistic.type_code(),
            sub_type_code: statistic.sub_type_code(),
            payment_method: statistic.payment_method().map(str::to_string),
            time_gap: gap.seconds(),
        };
        let points = fill_gaps(self.indexer.fetch_time_series(&query).await?);
        debug!("Fetched {} buckets for {:?} of {}:{}", points.len(), statistic, chain_id, project_id);

        let series = StatisticSeries {
            time_gap: gap.seconds(),
            current_index,
            points,
        };
        self.cache.set(&key, &series, self.config.statistic_ttl).await?;
        Ok(series)
    }

    /// Evict every cached statistic of a project.
    /// Walks the fixed enumeration of families, gaps and known payment methods.
    pub async fn remove_project_statistics(&self, chain_id: u64, project_id: u64) -> Result<usize, ServiceError> {
        let ids = project_stat_ids(chain_id, project_id, &self.config.payment_methods);
        for id in &ids {
            self.cache.del(id).await?;
        }

        info!("Removed {} statistic entries for project {}:{}", ids.len(), chain_id, project_id);
        Ok(ids.len())
    }
}

/// Buckets with no activity are absent from the indexer's answer and stay
/// absent here: no zero buckets are synthesized.
pub fn fill_gaps(points: Vec<StatisticPoint>) -> Vec<StatisticPoint> {
    points
}
