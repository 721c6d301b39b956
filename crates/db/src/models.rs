//! Row models and DTOs for the `tracks` table.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use aria_core::types::Timestamp;

/// A row from the `tracks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TrackRecord {
    pub id: String,
    pub title: String,
    pub lyrics: String,
    pub tags: String,
    pub audio_path: String,
    pub thumbnail_path: Option<String>,
    pub thumbnail_description: Option<String>,
    pub duration_ms: i64,
    pub max_audio_length_ms: i64,
    pub temperature: f64,
    pub topk: i64,
    pub cfg_scale: f64,
    pub owner: Option<String>,
    pub created_at: Timestamp,
}

/// Query parameters for `GET /api/history`.
#[derive(Debug, Deserialize)]
pub struct TrackListQuery {
    /// Case-insensitive substring match against title, lyrics, and tags.
    pub search: Option<String>,
    /// 1-based page number. Defaults to 1.
    pub page: Option<i64>,
    /// Page size. Defaults to 20, capped at 100.
    pub page_size: Option<i64>,
}

/// A page of tracks plus the total row count for the query.
#[derive(Debug, Serialize)]
pub struct TrackPage {
    pub items: Vec<TrackRecord>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}
