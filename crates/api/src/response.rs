//! Small shared response bodies.

use serde::Serialize;

/// Reply of the batch-replacing `add/*` endpoints.
#[derive(Debug, Serialize)]
pub struct InsertedResponse {
    pub inserted: u64,
}

/// `{ "message": ... }` reply.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    /// Tells a superseded prediction job to stop pushing results.
    pub const STOP: Self = Self { message: "STOP" };
}
