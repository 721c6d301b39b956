//! Queue inspection and cancellation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use aria_core::error::CoreError;
use aria_core::job::Job;
use aria_core::types::JobId;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Response body for `GET /api/queue`.
#[derive(Debug, Serialize)]
pub struct QueueResponse {
    /// Id of the currently-processing job, if any.
    pub active_id: Option<JobId>,
    /// Active jobs: processing first, then queued in FIFO order.
    pub jobs: Vec<Job>,
}

/// GET /queue -- all actively tracked jobs.
async fn get_queue(State(state): State<AppState>) -> Json<DataResponse<QueueResponse>> {
    Json(DataResponse {
        data: QueueResponse {
            active_id: state.scheduler.active_id(),
            jobs: state.scheduler.list_active(),
        },
    })
}

/// GET /queue/{id} -- point-in-time snapshot of one tracked job.
///
/// Terminal jobs leave active tracking, so this returns 404 for them;
/// completed work is found under `/api/history` instead.
async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<JobId>,
) -> AppResult<Json<DataResponse<Job>>> {
    let job = state
        .scheduler
        .status(id)
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Job", id }))?;
    Ok(Json(DataResponse { data: job }))
}

/// DELETE /queue/{id} -- request cancellation.
///
/// Queued jobs are cancelled immediately; the processing job stops at the
/// engine's next checkpoint. Unknown or already-terminal ids are 404.
async fn cancel_job(State(state): State<AppState>, Path(id): Path<JobId>) -> AppResult<StatusCode> {
    if state.scheduler.cancel(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound { entity: "Job", id }))
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/queue", get(get_queue))
        .route("/queue/{id}", get(get_job).delete(cancel_job))
}
