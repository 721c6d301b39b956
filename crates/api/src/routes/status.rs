//! System status reporting.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use aria_core::types::JobId;

use crate::response::DataResponse;
use crate::state::AppState;

/// Response body for `GET /api/status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Whether the generation model has been loaded.
    pub engine_loaded: bool,
    /// Id of the currently-processing job, if any.
    pub active_id: Option<JobId>,
    /// Number of jobs in active tracking (processing + queued).
    pub queue_length: usize,
    /// Whether the lyric assistant has an API key configured.
    pub assistant_configured: bool,
}

/// GET /status -- engine, queue, and assistant status.
async fn get_status(State(state): State<AppState>) -> Json<DataResponse<StatusResponse>> {
    Json(DataResponse {
        data: StatusResponse {
            engine_loaded: state.engine.is_loaded(),
            active_id: state.scheduler.active_id(),
            queue_length: state.scheduler.active_len(),
            assistant_configured: state.assistant.is_some(),
        },
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/status", get(get_status))
}
