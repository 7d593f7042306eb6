//! Handlers for the record passthrough endpoints.
//!
//! Temperature and cached prediction data are keyed by date-hour labels on
//! the wire and stored as one record per label. Every `add/*` call replaces
//! the whole batch for its discriminators.

use axum::extract::State;
use axum::Json;
use enercast_core::label::DateHourLabel;
use enercast_core::record::{DataType, TimeSeriesRecord};
use indexmap::IndexMap;

use crate::error::{AppError, AppResult};
use crate::response::InsertedResponse;
use crate::state::AppState;

/// Label → value mapping, in store order.
pub type LabelledValues = IndexMap<String, f64>;

/// Discriminators written and read by the predict-data endpoints.
const PREDICT_DATA_TYPES: [DataType; 2] = [DataType::Actual, DataType::Average];

fn parse_batch(
    data_type: &DataType,
    values: LabelledValues,
) -> AppResult<Vec<TimeSeriesRecord>> {
    values
        .into_iter()
        .map(|(key, value)| -> AppResult<TimeSeriesRecord> {
            let label: DateHourLabel = key.parse()?;
            Ok(TimeSeriesRecord::from_label(data_type.clone(), &label, value))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Dump
// ---------------------------------------------------------------------------

/// GET /
///
/// Every stored record, unfiltered.
pub async fn list_records(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<TimeSeriesRecord>>> {
    Ok(Json(state.store.find_all().await?))
}

// ---------------------------------------------------------------------------
// Temperature
// ---------------------------------------------------------------------------

/// POST /load/temp
pub async fn load_temp(State(state): State<AppState>) -> AppResult<Json<LabelledValues>> {
    let records = state.store.find_by_types(&[DataType::Temp]).await?;
    let temps = records
        .iter()
        .map(|r| (r.label().to_string(), r.value))
        .collect();
    Ok(Json(temps))
}

/// POST /add/temp
///
/// Replaces all temperature records with the posted mapping.
pub async fn add_temp(
    State(state): State<AppState>,
    Json(input): Json<LabelledValues>,
) -> AppResult<Json<InsertedResponse>> {
    let batch = parse_batch(&DataType::Temp, input)?;
    let inserted = state.store.replace_batch(&[DataType::Temp], batch).await?;

    tracing::info!(inserted, "Temperature data replaced");
    Ok(Json(InsertedResponse { inserted }))
}

// ---------------------------------------------------------------------------
// Cached prediction data
// ---------------------------------------------------------------------------

/// POST /load/predict-data
///
/// Returns `{ "act": {...}, "avg": {...} }`; a type with no records is omitted.
pub async fn load_predict_data(
    State(state): State<AppState>,
) -> AppResult<Json<IndexMap<String, LabelledValues>>> {
    let records = state.store.find_by_types(&PREDICT_DATA_TYPES).await?;

    let mut grouped: IndexMap<String, LabelledValues> = IndexMap::new();
    for record in &records {
        grouped
            .entry(record.data_type.to_string())
            .or_default()
            .insert(record.label().to_string(), record.value);
    }
    Ok(Json(grouped))
}

/// POST /add/predict-data
///
/// Replaces all `act` and `avg` records. Any other top-level key is rejected.
pub async fn add_predict_data(
    State(state): State<AppState>,
    Json(input): Json<IndexMap<String, LabelledValues>>,
) -> AppResult<Json<InsertedResponse>> {
    let mut batch = Vec::new();
    for (key, values) in input {
        let data_type: DataType = key.parse()?;
        if !PREDICT_DATA_TYPES.contains(&data_type) {
            return Err(AppError::BadRequest(format!(
                "Unsupported prediction data type '{key}', expected 'act' or 'avg'"
            )));
        }
        batch.extend(parse_batch(&data_type, values)?);
    }

    let inserted = state.store.replace_batch(&PREDICT_DATA_TYPES, batch).await?;

    tracing::info!(inserted, "Cached prediction data replaced");
    Ok(Json(InsertedResponse { inserted }))
}
