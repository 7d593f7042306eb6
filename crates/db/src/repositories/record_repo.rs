//! Repository for the `records` table.

use enercast_core::record::TimeSeriesRecord;
use sqlx::PgExecutor;

use crate::models::record::RecordRow;

/// Column list for `records` queries.
const COLUMNS: &str = "id, data_type, year, month, day, hour, value, created_at";

/// Provides batch operations over time-series records.
///
/// Reads are ordered by `id`, i.e. insertion order.
pub struct RecordRepo;

impl RecordRepo {
    /// Every record in the table.
    pub async fn list_all<'e, E: PgExecutor<'e>>(
        executor: E,
    ) -> Result<Vec<RecordRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM records ORDER BY id");
        sqlx::query_as::<_, RecordRow>(&query)
            .fetch_all(executor)
            .await
    }

    /// Records whose discriminator is one of `data_types`.
    pub async fn list_by_types<'e, E: PgExecutor<'e>>(
        executor: E,
        data_types: &[String],
    ) -> Result<Vec<RecordRow>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM records WHERE data_type = ANY($1) ORDER BY id");
        sqlx::query_as::<_, RecordRow>(&query)
            .bind(data_types)
            .fetch_all(executor)
            .await
    }

    /// Delete every record whose discriminator is one of `data_types`.
    pub async fn delete_by_types<'e, E: PgExecutor<'e>>(
        executor: E,
        data_types: &[String],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM records WHERE data_type = ANY($1)")
            .bind(data_types)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Insert `records` in order with a single statement.
    pub async fn insert_many<'e, E: PgExecutor<'e>>(
        executor: E,
        records: &[TimeSeriesRecord],
    ) -> Result<u64, sqlx::Error> {
        if records.is_empty() {
            return Ok(0);
        }

        let data_types: Vec<String> = records.iter().map(|r| r.data_type.to_string()).collect();
        let years: Vec<Option<i32>> = records.iter().map(|r| r.year).collect();
        let months: Vec<Option<i32>> = records.iter().map(|r| r.month).collect();
        let days: Vec<Option<i32>> = records.iter().map(|r| r.day).collect();
        let hours: Vec<i32> = records.iter().map(|r| r.hour).collect();
        let values: Vec<f64> = records.iter().map(|r| r.value).collect();

        let result = sqlx::query(
            "INSERT INTO records (data_type, year, month, day, hour, value) \
             SELECT * FROM UNNEST($1::text[], $2::int4[], $3::int4[], $4::int4[], \
                                  $5::int4[], $6::float8[])",
        )
        .bind(&data_types)
        .bind(&years)
        .bind(&months)
        .bind(&days)
        .bind(&hours)
        .bind(&values)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
