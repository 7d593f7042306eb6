//! Route definitions for prediction jobs.

use axum::routing::post;
use axum::Router;

use crate::handlers::prediction;
use crate::state::AppState;

/// ```text
/// POST   /predict           -> predict
/// POST   /load/day-data     -> load_day_data
/// POST   /load/hour-data    -> load_hour_data
/// POST   /add/hour-data     -> add_hour_data
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/predict", post(prediction::predict))
        .route("/load/day-data", post(prediction::load_day_data))
        .route("/load/hour-data", post(prediction::load_hour_data))
        .route("/add/hour-data", post(prediction::add_hour_data))
}
