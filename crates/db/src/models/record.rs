//! Record row model.

use enercast_core::record::{DataType, TimeSeriesRecord};
use enercast_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

use crate::error::StoreError;

/// A row from the `records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RecordRow {
    pub id: i64,
    pub data_type: String,
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub day: Option<i32>,
    pub hour: i32,
    pub value: f64,
    pub created_at: Timestamp,
}

impl TryFrom<RecordRow> for TimeSeriesRecord {
    type Error = StoreError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let data_type = row
            .data_type
            .parse::<DataType>()
            .map_err(|e| StoreError::InvalidRecord {
                id: row.id,
                reason: e.to_string(),
            })?;
        Ok(Self {
            data_type,
            year: row.year,
            month: row.month,
            day: row.day,
            hour: row.hour,
            value: row.value,
        })
    }
}
