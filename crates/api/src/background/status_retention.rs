//! Periodic eviction of old job status entries.
//!
//! Without it the job status table keeps one entry per user that ever
//! started a prediction for the life of the process. Runs on a fixed
//! interval using `tokio::time::interval`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use enercast_core::prediction::JobStatusTable;
use tokio_util::sync::CancellationToken;

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(300); // 5 minutes

/// Evict entries registered more than `ttl_secs` ago. Returns how many went.
///
/// A TTL reaching past the representable time range evicts nothing.
pub async fn sweep_once(jobs: &JobStatusTable, ttl_secs: u64) -> usize {
    let cutoff = i64::try_from(ttl_secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .and_then(|ttl| Utc::now().checked_sub_signed(ttl));
    let Some(cutoff) = cutoff else {
        tracing::warn!(ttl_secs, "Job status TTL out of range, skipping sweep");
        return 0;
    };
    jobs.evict_older_than(cutoff).await
}

/// Run the retention loop until `cancel` is triggered.
pub async fn run(jobs: Arc<JobStatusTable>, ttl_secs: u64, cancel: CancellationToken) {
    tracing::info!(
        ttl_secs,
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Job status retention started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Job status retention stopping");
                break;
            }
            _ = interval.tick() => {
                let evicted = sweep_once(&jobs, ttl_secs).await;
                if evicted > 0 {
                    tracing::info!(evicted, "Job status retention: evicted old entries");
                } else {
                    tracing::debug!("Job status retention: nothing to evict");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sweep_keeps_entries_within_ttl() {
        let jobs = JobStatusTable::new();
        jobs.register("alice").await;

        assert_eq!(sweep_once(&jobs, 3600).await, 0);
        assert_eq!(jobs.len().await, 1);
    }

    #[tokio::test]
    async fn sweep_evicts_expired_entries() {
        let jobs = JobStatusTable::new();
        jobs.register("alice").await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(sweep_once(&jobs, 0).await, 1);
        assert!(jobs.is_empty().await);
    }

    #[tokio::test]
    async fn sweep_with_out_of_range_ttl_keeps_entries() {
        let jobs = JobStatusTable::new();
        jobs.register("alice").await;

        assert_eq!(sweep_once(&jobs, u64::MAX).await, 0);
        assert_eq!(sweep_once(&jobs, i64::MAX as u64).await, 0);
        assert_eq!(jobs.len().await, 1);
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let jobs = Arc::new(JobStatusTable::new());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(Arc::clone(&jobs), 60, cancel.clone()));

        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("retention loop should stop")
            .unwrap();
    }
}
