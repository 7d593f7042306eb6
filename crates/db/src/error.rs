/// Errors raised by a [`RecordStore`](crate::store::RecordStore).
///
/// Messages are passed through to API clients unchanged.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("Invalid stored record {id}: {reason}")]
    InvalidRecord { id: i64, reason: String },
}
