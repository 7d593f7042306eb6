use std::sync::Arc;

use enercast_core::prediction::JobStatusTable;
use enercast_db::RecordStore;

use crate::config::ServerConfig;
use crate::prediction::PredictionLauncher;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Time-series record store.
    pub store: Arc<dyn RecordStore>,
    /// Live token and completion flag per user.
    pub jobs: Arc<JobStatusTable>,
    /// Starts prediction jobs.
    pub launcher: Arc<PredictionLauncher>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire a fresh job status table and launcher around `store`.
    pub fn new(store: Arc<dyn RecordStore>, config: ServerConfig) -> Self {
        let jobs = Arc::new(JobStatusTable::new());
        let launcher = Arc::new(PredictionLauncher::new(
            Arc::clone(&store),
            Arc::clone(&jobs),
            config.predict.clone(),
        ));
        Self {
            store,
            jobs,
            launcher,
            config: Arc::new(config),
        }
    }
}
