//! Lyric drafting endpoint backed by the OpenAI client.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use crate::assistant::{LyricsDraft, LyricsPrompt};
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /assistant/lyrics -- draft a title, lyrics, and tags.
///
/// Returns 503 when no API key is configured.
async fn draft_lyrics(
    State(state): State<AppState>,
    Json(prompt): Json<LyricsPrompt>,
) -> AppResult<Json<DataResponse<LyricsDraft>>> {
    if prompt.theme.trim().is_empty() {
        return Err(AppError::BadRequest("theme must not be empty".into()));
    }

    let client = state
        .assistant
        .as_ref()
        .ok_or(AppError::AssistantUnconfigured)?;

    let draft = client
        .draft_lyrics(&prompt)
        .await
        .map_err(|e| AppError::Assistant(e.to_string()))?;

    Ok(Json(DataResponse { data: draft }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/assistant/lyrics", post(draft_lyrics))
}
