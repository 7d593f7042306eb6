//! Prediction job orchestration.
//!
//! The [`PredictionLauncher`] ties the record store, the job status table
//! and the process runner together. Held in
//! [`AppState`](crate::state::AppState) as an `Arc<PredictionLauncher>`.

pub mod launcher;

pub use launcher::PredictionLauncher;
