//! Periodic cache eviction, promotion, and evidence pruning

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::domain::cache::{CacheStore, EvictionPolicy, EvictionReport};
use crate::domain::evidence::EvidenceStore;
use crate::domain::DomainError;

/// Maintenance tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Seconds between passes
    pub interval_secs: u64,
    /// Cache eviction parameters
    pub eviction: EvictionPolicy,
    /// Evidence older than this without access is prunable
    pub evidence_retention_days: i64,
    /// Evidence used fewer times than this is prunable once stale
    pub evidence_min_usage: u64,
    /// Usage count at which evidence is pinned against pruning
    pub promotion_threshold: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            eviction: EvictionPolicy::default(),
            evidence_retention_days: 60,
            evidence_min_usage: 10,
            promotion_threshold: 20,
        }
    }
}

/// Outcome of one maintenance pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceReport {
    pub cache: EvictionReport,
    pub evidence_promoted: usize,
    pub evidence_evicted: usize,
    /// Cache hit rate at the time of the pass
    pub hit_rate: f32,
}

/// Runs maintenance out of band of the query path.
///
/// Each pass evicts stale cache entries in bounded batches, promotes
/// frequently cited evidence, and prunes evidence that is both stale
/// and rarely used. Stores synchronize internally, so a pass never
/// blocks live queries.
#[derive(Debug)]
pub struct MaintenanceScheduler {
    cache: Arc<dyn CacheStore>,
    evidence: Arc<dyn EvidenceStore>,
    config: MaintenanceConfig,
}

impl MaintenanceScheduler {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        evidence: Arc<dyn EvidenceStore>,
        config: MaintenanceConfig,
    ) -> Self {
        Self {
            cache,
            evidence,
            config,
        }
    }

    /// Execute a single pass
    pub async fn run_once(&self) -> Result<MaintenanceReport, DomainError> {
        let cache_report = self.cache.evict(&self.config.eviction).await?;

        let evidence_promoted = self
            .evidence
            .promote_frequent(self.config.promotion_threshold)
            .await?;

        let evidence_evicted = self
            .evidence
            .evict_stale(
                self.config.evidence_retention_days,
                self.config.evidence_min_usage,
            )
            .await?;

        let stats = self.cache.stats().await?;

        let report = MaintenanceReport {
            cache: cache_report,
            evidence_promoted,
            evidence_evicted,
            hit_rate: stats.hit_rate(),
        };

        info!(
            examined = report.cache.examined,
            evicted = report.cache.evicted,
            promoted = report.cache.promoted,
            evidence_promoted,
            evidence_evicted,
            hit_rate = report.hit_rate,
            cache_entries = stats.total_entries,
            "maintenance pass complete"
        );

        Ok(report)
    }

    /// Spawn the periodic loop; the returned handle stops it cleanly
    pub fn spawn(self: Arc<Self>) -> MaintenanceHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let interval = Duration::from_secs(self.config.interval_secs);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it so startup is quiet
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.run_once().await {
                            error!(error = %e, "maintenance pass failed");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        info!("maintenance scheduler stopping");
                        break;
                    }
                }
            }
        });

        MaintenanceHandle { shutdown_tx, task }
    }
}

/// Stops the spawned maintenance loop
#[derive(Debug)]
pub struct MaintenanceHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MaintenanceHandle {
    pub async fn shutdown(self) {
        // Receiver dropping also stops the loop, so send errors are moot
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }
}
