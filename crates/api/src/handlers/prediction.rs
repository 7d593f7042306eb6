//! Handlers for starting prediction jobs and polling their results.
//!
//! A client starts a job, receives a token, then polls `load/day-data` or
//! `load/hour-data` with it. The external job pushes partial results to
//! `add/hour-data` with the same token. A token that is no longer the live
//! one for its user is stale: polls answer empty and pushes answer `STOP`.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use enercast_core::error::CoreError;
use enercast_core::label::DateHourLabel;
use enercast_core::prediction::PredictionWindow;
use enercast_core::record::{
    aggregate_by_day, hourly_points, DataType, PredictionPoint, TimeSeriesRecord,
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::response::{InsertedResponse, MessageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    pub username: String,
    pub from_date: String,
    pub from_time: String,
    pub to_date: String,
    pub to_time: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct PollRequest {
    pub username: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub data: Vec<PredictionPoint>,
    pub end: bool,
}

impl PollResponse {
    /// Answer for a stale or unknown token.
    fn stale() -> Self {
        Self {
            data: Vec::new(),
            end: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HourDataEntry {
    #[serde(rename = "dateTime")]
    pub date_time: String,
    pub yhat: f64,
}

#[derive(Debug, Deserialize)]
pub struct AddHourDataRequest {
    pub username: String,
    pub token: String,
    pub data: Vec<HourDataEntry>,
}

// ---------------------------------------------------------------------------
// Start
// ---------------------------------------------------------------------------

/// POST /predict
///
/// Clears the user's previous results, supersedes any running job and
/// launches a new one. Responds with the token as soon as the job is handed
/// to its supervisor.
pub async fn predict(
    State(state): State<AppState>,
    Json(input): Json<PredictRequest>,
) -> AppResult<Json<PredictResponse>> {
    if input.username.trim().is_empty() {
        return Err(CoreError::Validation("username must not be empty".into()).into());
    }

    let window = PredictionWindow {
        from_date: input.from_date,
        from_time: input.from_time,
        to_date: input.to_date,
        to_time: input.to_time,
    };
    let handle = state.launcher.start(&input.username, &window).await?;

    Ok(Json(PredictResponse {
        token: handle.into_token(),
    }))
}

// ---------------------------------------------------------------------------
// Polling
// ---------------------------------------------------------------------------

/// Shared polling flow.
///
/// The status is read before the records so that `end: true` is only ever
/// paired with data read after the job signalled completion.
async fn poll(
    state: &AppState,
    input: &PollRequest,
    render: fn(&[TimeSeriesRecord]) -> Vec<PredictionPoint>,
) -> AppResult<PollResponse> {
    let status = match state.jobs.snapshot(&input.username).await {
        Some(status) if status.token == input.token => status,
        _ => return Ok(PollResponse::stale()),
    };

    let records = state
        .store
        .find_by_types(&[DataType::user(&input.username)])
        .await?;

    Ok(PollResponse {
        data: render(&records),
        end: status.complete,
    })
}

/// POST /load/day-data
///
/// Per-day sums of the user's prediction results.
pub async fn load_day_data(
    State(state): State<AppState>,
    Json(input): Json<PollRequest>,
) -> AppResult<Json<PollResponse>> {
    Ok(Json(poll(&state, &input, aggregate_by_day).await?))
}

/// POST /load/hour-data
///
/// One point per stored hourly result.
pub async fn load_hour_data(
    State(state): State<AppState>,
    Json(input): Json<PollRequest>,
) -> AppResult<Json<PollResponse>> {
    Ok(Json(poll(&state, &input, hourly_points).await?))
}

// ---------------------------------------------------------------------------
// Result push
// ---------------------------------------------------------------------------

/// POST /add/hour-data
///
/// Called by the running job. Replaces (does not append to) the user's
/// stored results. A stale token gets `{"message": "STOP"}` and the store is
/// left untouched. The token check and the write happen under the user's
/// guard, so a concurrent `/predict` either sees this batch and clears it or
/// makes the token stale before it is checked.
pub async fn add_hour_data(
    State(state): State<AppState>,
    Json(input): Json<AddHourDataRequest>,
) -> AppResult<Response> {
    let _guard = state.jobs.lock_user(&input.username).await;
    if !state.jobs.is_current(&input.username, &input.token).await {
        tracing::info!(
            user = %input.username,
            token = %input.token,
            "Rejecting results from superseded job",
        );
        return Ok(Json(MessageResponse::STOP).into_response());
    }

    let data_type = DataType::user(&input.username);
    let batch = input
        .data
        .iter()
        .map(|entry| -> Result<TimeSeriesRecord, CoreError> {
            let label: DateHourLabel = entry.date_time.parse()?;
            if label.date.is_none() {
                return Err(CoreError::Validation(format!(
                    "dateTime '{}' must include a date",
                    entry.date_time
                )));
            }
            Ok(TimeSeriesRecord::from_label(data_type.clone(), &label, entry.yhat))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let inserted = state.store.replace_batch(&[data_type], batch).await?;

    tracing::debug!(user = %input.username, inserted, "Prediction results replaced");
    Ok(Json(InsertedResponse { inserted }).into_response())
}
