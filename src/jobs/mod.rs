//! Scheduled Jobs
//!
//! Background jobs for periodic maintenance tasks.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::auth::RevocationStore;
use crate::store::StoreError;

// =========================================================================
// Revocation list purge
// =========================================================================

/// Drop revocation entries whose tokens have expired on their own
pub async fn purge_expired_revocations(store: &dyn RevocationStore) -> Result<u64, JobError> {
    let rows_deleted = store.purge_expired().await?;

    if rows_deleted > 0 {
        tracing::info!(
            rows_deleted = rows_deleted,
            "Purged expired token revocations"
        );
    }

    Ok(rows_deleted)
}

// =========================================================================
// Job Scheduler
// =========================================================================

/// Configuration for job scheduler
#[derive(Debug, Clone)]
pub struct JobSchedulerConfig {
    /// Interval for revocation purge (default: 5 minutes)
    pub revocation_purge_interval: Duration,
}

impl Default for JobSchedulerConfig {
    fn default() -> Self {
        Self {
            revocation_purge_interval: Duration::from_secs(300),
        }
    }
}

/// Shortest purge period the scheduler will run with
const MIN_PURGE_INTERVAL: Duration = Duration::from_secs(1);

/// Job Scheduler - runs periodic maintenance tasks
pub struct JobScheduler {
    revocations: Arc<dyn RevocationStore>,
    config: JobSchedulerConfig,
}

impl JobScheduler {
    pub fn new(revocations: Arc<dyn RevocationStore>) -> Self {
        Self {
            revocations,
            config: JobSchedulerConfig::default(),
        }
    }

    pub fn with_config(revocations: Arc<dyn RevocationStore>, config: JobSchedulerConfig) -> Self {
        Self {
            revocations,
            config,
        }
    }

    /// Start the job scheduler in the background
    /// Returns a handle that can be used to abort the scheduler
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        tracing::info!(
            purge_interval_secs = self.config.revocation_purge_interval.as_secs(),
            "Job scheduler started"
        );

        // `interval` panics on a zero period
        let mut purge_interval =
            interval(self.config.revocation_purge_interval.max(MIN_PURGE_INTERVAL));

        loop {
            purge_interval.tick().await;
            if let Err(e) = purge_expired_revocations(self.revocations.as_ref()).await {
                tracing::error!(error = %e, "Revocation purge failed");
            }
        }
    }

    /// Run all maintenance jobs once (for manual trigger or testing)
    pub async fn run_all_once(&self) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();

        match purge_expired_revocations(self.revocations.as_ref()).await {
            Ok(count) => report.revocations_purged = count,
            Err(e) => report.errors.push(format!("Revocation purge: {}", e)),
        }

        report.completed_at = Utc::now();
        report
    }
}

/// Report from running maintenance jobs
#[derive(Debug, Clone, Default)]
pub struct MaintenanceReport {
    pub revocations_purged: u64,
    pub errors: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

/// Job execution errors
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::InMemoryRevocationStore;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn test_job_scheduler_config_default() {
        let config = JobSchedulerConfig::default();
        assert_eq!(config.revocation_purge_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_maintenance_report_default() {
        let report = MaintenanceReport::default();
        assert_eq!(report.revocations_purged, 0);
        assert_eq!(report.errors.len(), 0);
    }

    #[tokio::test]
    async fn test_zero_interval_scheduler_keeps_running() {
        let store = Arc::new(InMemoryRevocationStore::new());
        let handle = JobScheduler::with_config(
            store,
            JobSchedulerConfig {
                revocation_purge_interval: Duration::ZERO,
            },
        )
        .start();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test]
    async fn test_run_all_once_purges_expired() {
        let store = Arc::new(InMemoryRevocationStore::new());
        store
            .revoke("expired", Utc::now() - ChronoDuration::seconds(5))
            .await
            .unwrap();
        store
            .revoke("live", Utc::now() + ChronoDuration::hours(1))
            .await
            .unwrap();

        let report = JobScheduler::new(store.clone()).run_all_once().await;

        assert_eq!(report.revocations_purged, 1);
        assert!(report.errors.is_empty());
        assert_eq!(store.len().await, 1);
    }
}
