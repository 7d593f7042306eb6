//! The record store seam used by the HTTP layer.
//!
//! Every discriminator is a replaceable batch, so the write path is
//! [`RecordStore::replace_batch`]: delete all records of the listed
//! discriminators, then insert the new batch.

use async_trait::async_trait;
use enercast_core::record::{DataType, TimeSeriesRecord};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::repositories::RecordRepo;
use crate::DbPool;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every record, in insertion order.
    async fn find_all(&self) -> Result<Vec<TimeSeriesRecord>, StoreError>;

    /// Records of the given discriminators, in insertion order.
    async fn find_by_types(&self, types: &[DataType])
        -> Result<Vec<TimeSeriesRecord>, StoreError>;

    /// Delete records of the given discriminators. Returns rows removed.
    async fn delete_by_types(&self, types: &[DataType]) -> Result<u64, StoreError>;

    /// Delete records of `types`, then insert `records`. Returns rows inserted.
    async fn replace_batch(
        &self,
        types: &[DataType],
        records: Vec<TimeSeriesRecord>,
    ) -> Result<u64, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

fn type_names(types: &[DataType]) -> Vec<String> {
    types.iter().map(ToString::to_string).collect()
}

fn into_records(
    rows: Vec<crate::models::record::RecordRow>,
) -> Result<Vec<TimeSeriesRecord>, StoreError> {
    rows.into_iter().map(TimeSeriesRecord::try_from).collect()
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// [`RecordStore`] backed by the `records` table.
pub struct PgRecordStore {
    pool: DbPool,
}

impl PgRecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_all(&self) -> Result<Vec<TimeSeriesRecord>, StoreError> {
        into_records(RecordRepo::list_all(&self.pool).await?)
    }

    async fn find_by_types(
        &self,
        types: &[DataType],
    ) -> Result<Vec<TimeSeriesRecord>, StoreError> {
        into_records(RecordRepo::list_by_types(&self.pool, &type_names(types)).await?)
    }

    async fn delete_by_types(&self, types: &[DataType]) -> Result<u64, StoreError> {
        Ok(RecordRepo::delete_by_types(&self.pool, &type_names(types)).await?)
    }

    async fn replace_batch(
        &self,
        types: &[DataType],
        records: Vec<TimeSeriesRecord>,
    ) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let deleted = RecordRepo::delete_by_types(&mut *tx, &type_names(types)).await?;
        let inserted = RecordRepo::insert_many(&mut *tx, &records).await?;
        tx.commit().await?;

        tracing::debug!(?types, deleted, inserted, "Replaced record batch");
        Ok(inserted)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(crate::health_check(&self.pool).await?)
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// [`RecordStore`] held in process memory. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<TimeSeriesRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_all(&self) -> Result<Vec<TimeSeriesRecord>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn find_by_types(
        &self,
        types: &[DataType],
    ) -> Result<Vec<TimeSeriesRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| types.contains(&r.data_type))
            .cloned()
            .collect())
    }

    async fn delete_by_types(&self, types: &[DataType]) -> Result<u64, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| !types.contains(&r.data_type));
        Ok((before - records.len()) as u64)
    }

    async fn replace_batch(
        &self,
        types: &[DataType],
        batch: Vec<TimeSeriesRecord>,
    ) -> Result<u64, StoreError> {
        let mut records = self.records.write().await;
        records.retain(|r| !types.contains(&r.data_type));
        let inserted = batch.len() as u64;
        records.extend(batch);
        Ok(inserted)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
