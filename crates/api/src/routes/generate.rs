//! Job submission: the admission edge of the scheduling core.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use validator::Validate;

use aria_core::job::{JobSpec, JobStatus};
use aria_core::params::GenerationParams;
use aria_core::types::JobId;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /api/generate`.
///
/// Parameter bounds are validated here, before admission; an invalid
/// request never enters the queue.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    pub title: Option<String>,
    #[validate(length(min = 1, message = "lyrics must not be empty"))]
    pub lyrics: String,
    #[validate(length(min = 1, message = "tags must not be empty"))]
    pub tags: String,
    #[serde(default)]
    #[validate(nested)]
    pub params: GenerationParams,
    pub owner: Option<String>,
}

/// Response body: the admitted job's identity and initial state.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub id: JobId,
    pub status: JobStatus,
    pub total_frames: u64,
}

/// POST /generate -- validate and admit a new generation job.
async fn submit_job(
    State(state): State<AppState>,
    Json(payload): Json<GenerateRequest>,
) -> AppResult<Json<DataResponse<GenerateResponse>>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let total_frames = payload.params.total_frames();
    let id = state.scheduler.submit(JobSpec {
        title: payload.title,
        lyrics: payload.lyrics,
        tags: payload.tags,
        params: payload.params,
        owner: payload.owner,
    });

    Ok(Json(DataResponse {
        data: GenerateResponse {
            id,
            status: JobStatus::Pending,
            total_frames,
        },
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/generate", post(submit_job))
}
