//! Central prediction launcher.

use std::sync::Arc;

use enercast_core::prediction::{JobHandle, JobRunner, JobStatusTable, PredictionWindow};
use enercast_core::record::DataType;
use enercast_db::RecordStore;

use crate::config::PredictConfig;
use crate::error::AppResult;

/// Starts prediction jobs for users.
///
/// Manages the start sequence:
/// 1. Take the user's guard so no result push interleaves with the restart.
/// 2. Clear the user's previous prediction records.
/// 3. Register a fresh token, superseding any in-flight job.
/// 4. Release the guard, hand the external process to a supervisor and
///    return immediately.
pub struct PredictionLauncher {
    store: Arc<dyn RecordStore>,
    jobs: Arc<JobStatusTable>,
    runner: JobRunner,
}

impl PredictionLauncher {
    pub fn new(
        store: Arc<dyn RecordStore>,
        jobs: Arc<JobStatusTable>,
        config: PredictConfig,
    ) -> Self {
        let runner = JobRunner::new(config.command, config.completion, Arc::clone(&jobs));
        Self {
            store,
            jobs,
            runner,
        }
    }

    /// Start a prediction for `user` over `window`.
    ///
    /// A store failure while clearing old records aborts the start before a
    /// token is minted. Process failures never surface here.
    pub async fn start(&self, user: &str, window: &PredictionWindow) -> AppResult<JobHandle> {
        let (token, cleared) = {
            let _guard = self.jobs.lock_user(user).await;
            let cleared = self.store.delete_by_types(&[DataType::user(user)]).await?;
            (self.jobs.register(user).await, cleared)
        };

        tracing::info!(
            user,
            token = %token,
            cleared,
            from_date = %window.from_date,
            to_date = %window.to_date,
            "Starting prediction job",
        );

        Ok(self.runner.launch(user, &token, window))
    }
}
