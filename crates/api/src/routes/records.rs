//! Route definitions for the record passthrough endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::records;
use crate::state::AppState;

/// ```text
/// GET    /                    -> list_records
/// POST   /load/temp           -> load_temp
/// POST   /add/temp            -> add_temp
/// POST   /load/predict-data   -> load_predict_data
/// POST   /add/predict-data    -> add_predict_data
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(records::list_records))
        .route("/load/temp", post(records::load_temp))
        .route("/add/temp", post(records::add_temp))
        .route("/load/predict-data", post(records::load_predict_data))
        .route("/add/predict-data", post(records::add_predict_data))
}
