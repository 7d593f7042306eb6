//! Domain logic for the energy prediction backend.
//!
//! Everything here is free of database and HTTP concerns: the time-series
//! record model, date-hour labels, the per-user job status table, and the
//! supervisor that owns external prediction processes.

pub mod error;
pub mod label;
pub mod prediction;
pub mod record;
pub mod types;
