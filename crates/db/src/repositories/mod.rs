//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept a pool or transaction as the first argument.

pub mod record_repo;

pub use record_repo::RecordRepo;
