// Background reconciliation of every locally projected project

use crate::db::ProjectStore;
use crate::service::{ProjectService, ServiceError};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub reconciled: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct SyncService {
    store: Arc<dyn ProjectStore>,
    projects: ProjectService,
    concurrency: usize,
}

impl SyncService {
    pub fn new(store: Arc<dyn ProjectStore>, projects: ProjectService, concurrency: usize) -> Self {
        Self {
            store,
            projects,
            concurrency: concurrency.max(1),
        }
    }

    /// Reconcile all projections of a chain. One failing project does not
    /// stop the others; failures are counted and logged.
    pub async fn sync_chain(&self, chain_id: u64) -> Result<SyncReport, ServiceError> {
        let project_ids = self.store.list_project_ids(chain_id).await?;
        debug!("Syncing {} projects on chain {}", project_ids.len(), chain_id);

        let results: Vec<(u64, Result<_, ServiceError>)> = stream::iter(project_ids)
            .map(|project_id| async move { (project_id, self.projects.reconcile(chain_id, project_id).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = SyncReport::default();
        for (project_id, result) in results {
            match result {
                Ok(_) => report.reconciled += 1,
                Err(e) => {
                    error!("Failed to reconcile project {}:{}: {}", chain_id, project_id, e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Run `sync_chain` for each chain on every tick until cancelled
    pub async fn run_sync_loop(self, chains: Vec<u64>, every: Duration, shutdown: CancellationToken) {
        info!("Starting project sync every {:?} for chains {:?}", every, chains);
        let mut ticker = interval(every);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    for chain_id in &chains {
                        match self.sync_chain(*chain_id).await {
                            Ok(report) => info!(
                                "Synced chain {}: {} reconciled, {} failed",
                                chain_id, report.reconciled, report.failed
                            ),
                            Err(e) => error!("Sync of chain {} failed: {}", chain_id, e),
                        }
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("Shutting down project sync");
                    break;
                }
            }
        }
    }
}
