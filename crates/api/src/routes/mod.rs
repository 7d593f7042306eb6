pub mod health;
pub mod prediction;
pub mod records;

use axum::Router;

use crate::state::AppState;

/// Build the application route tree.
///
/// Route hierarchy:
///
/// ```text
/// /                     GET   dump every record
/// /load/temp            POST  temperature mapping
/// /add/temp             POST  replace temperature mapping
/// /load/predict-data    POST  cached act/avg mappings
/// /add/predict-data     POST  replace cached act/avg mappings
///
/// /predict              POST  start a prediction job
/// /load/day-data        POST  poll per-day results
/// /load/hour-data       POST  poll per-hour results
/// /add/hour-data        POST  push results from a running job
/// ```
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .merge(records::router())
        .merge(prediction::router())
}
