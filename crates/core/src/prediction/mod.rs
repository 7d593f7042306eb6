//! Prediction job coordination.
//!
//! [`status::JobStatusTable`] tracks the live token and completion flag per
//! user. [`runner::JobRunner`] launches the external prediction process and
//! hands it to a supervisory task that flips the completion flag when the
//! process signals output.

pub mod runner;
pub mod status;

pub use runner::{
    CompletionSignal, JobHandle, JobOutcome, JobRunner, PredictCommand, PredictionWindow,
};
pub use status::{JobStatus, JobStatusTable, UserGuard};
