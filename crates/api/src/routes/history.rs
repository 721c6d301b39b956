//! Finished-track browsing and artifact serving.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use tokio_util::io::ReaderStream;

use aria_core::error::CoreError;
use aria_core::types::JobId;
use aria_db::models::{TrackListQuery, TrackPage, TrackRecord};
use aria_db::repositories::TrackRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

async fn ensure_track_exists(state: &AppState, id: JobId) -> AppResult<TrackRecord> {
    TrackRepo::find_by_id(&state.pool, &id.to_string())
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Track",
            id,
        }))
}

/// GET /history -- finished tracks, newest first, with optional search.
async fn list_tracks(
    State(state): State<AppState>,
    Query(params): Query<TrackListQuery>,
) -> AppResult<Json<DataResponse<TrackPage>>> {
    let page = TrackRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /history/{id} -- one finished track.
async fn get_track(
    State(state): State<AppState>,
    Path(id): Path<JobId>,
) -> AppResult<Json<DataResponse<TrackRecord>>> {
    let track = ensure_track_exists(&state, id).await?;
    Ok(Json(DataResponse { data: track }))
}

/// DELETE /history/{id} -- remove a track row and its artifact files.
async fn delete_track(State(state): State<AppState>, Path(id): Path<JobId>) -> AppResult<StatusCode> {
    let track = ensure_track_exists(&state, id).await?;

    TrackRepo::delete(&state.pool, &track.id).await?;

    // Artifact removal is best-effort; a missing file is not an error.
    for path in std::iter::once(track.audio_path.as_str())
        .chain(track.thumbnail_path.as_deref())
    {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(track_id = %track.id, path, error = %e, "Failed to remove artifact");
            }
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /audio/{id} -- stream the audio artifact.
async fn get_audio(State(state): State<AppState>, Path(id): Path<JobId>) -> AppResult<Response> {
    let track = ensure_track_exists(&state, id).await?;
    serve_file(&track.audio_path, "audio/wav", id).await
}

/// GET /thumbnail/{id} -- stream the artwork.
async fn get_thumbnail(
    State(state): State<AppState>,
    Path(id): Path<JobId>,
) -> AppResult<Response> {
    let track = ensure_track_exists(&state, id).await?;
    let path = track
        .thumbnail_path
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Thumbnail",
            id,
        }))?;
    serve_file(&path, "image/png", id).await
}

/// Stream a file from disk with the given content type.
async fn serve_file(path: &str, content_type: &'static str, id: JobId) -> AppResult<Response> {
    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            // The row exists but its artifact is gone from disk.
            return Err(AppError::Core(CoreError::NotFound { entity: "File", id }));
        }
        Err(e) => return Err(AppError::InternalError(format!("Cannot open {path}: {e}"))),
    };

    let stream = ReaderStream::new(file);
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::InternalError(e.to_string()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/history", get(list_tracks))
        .route("/history/{id}", get(get_track).delete(delete_track))
        .route("/audio/{id}", get(get_audio))
        .route("/thumbnail/{id}", get(get_thumbnail))
}
