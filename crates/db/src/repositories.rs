//! Repository for the `tracks` table.

use crate::models::{TrackListQuery, TrackPage, TrackRecord};
use crate::DbPool;

/// Column list for `tracks` queries.
const COLUMNS: &str = "\
    id, title, lyrics, tags, audio_path, thumbnail_path, thumbnail_description, \
    duration_ms, max_audio_length_ms, temperature, topk, cfg_scale, \
    owner, created_at";

/// Maximum page size for track listing.
const MAX_PAGE_SIZE: i64 = 100;

/// Default page size for track listing.
const DEFAULT_PAGE_SIZE: i64 = 20;

/// Fields for inserting a new track row.
#[derive(Debug, Clone)]
pub struct NewTrack {
    pub id: String,
    pub title: String,
    pub lyrics: String,
    pub tags: String,
    pub audio_path: String,
    pub duration_ms: i64,
    pub max_audio_length_ms: i64,
    pub temperature: f64,
    pub topk: i64,
    pub cfg_scale: f64,
    pub owner: Option<String>,
    pub created_at: aria_core::types::Timestamp,
}

/// CRUD operations for finished tracks.
pub struct TrackRepo;

impl TrackRepo {
    /// Insert a completed generation. Called exactly once per completed job.
    pub async fn insert(pool: &DbPool, track: &NewTrack) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO tracks \
                 (id, title, lyrics, tags, audio_path, duration_ms, \
                  max_audio_length_ms, temperature, topk, cfg_scale, owner, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&track.id)
        .bind(&track.title)
        .bind(&track.lyrics)
        .bind(&track.tags)
        .bind(&track.audio_path)
        .bind(track.duration_ms)
        .bind(track.max_audio_length_ms)
        .bind(track.temperature)
        .bind(track.topk)
        .bind(track.cfg_scale)
        .bind(&track.owner)
        .bind(track.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Find a track by its id.
    pub async fn find_by_id(pool: &DbPool, id: &str) -> Result<Option<TrackRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tracks WHERE id = ?");
        sqlx::query_as::<_, TrackRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List tracks newest first, with optional substring search across
    /// title, lyrics, and tags.
    pub async fn list(pool: &DbPool, params: &TrackListQuery) -> Result<TrackPage, sqlx::Error> {
        let page = params.page.unwrap_or(1).max(1);
        let page_size = params
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1) * page_size;

        let (where_clause, pattern) = match params.search.as_deref() {
            Some(s) if !s.trim().is_empty() => (
                "WHERE title LIKE ? OR lyrics LIKE ? OR tags LIKE ?",
                Some(format!("%{}%", s.trim())),
            ),
            _ => ("", None),
        };

        let count_query = format!("SELECT COUNT(*) FROM tracks {where_clause}");
        let mut count = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(p) = pattern.as_ref() {
            count = count.bind(p).bind(p).bind(p);
        }
        let total = count.fetch_one(pool).await?;

        let list_query = format!(
            "SELECT {COLUMNS} FROM tracks {where_clause} \
             ORDER BY created_at DESC LIMIT ? OFFSET ?"
        );
        let mut list = sqlx::query_as::<_, TrackRecord>(&list_query);
        if let Some(p) = pattern.as_ref() {
            list = list.bind(p).bind(p).bind(p);
        }
        let items = list.bind(page_size).bind(offset).fetch_all(pool).await?;

        Ok(TrackPage {
            items,
            total,
            page,
            page_size,
        })
    }

    /// Delete a track row. Returns `false` when the id is unknown.
    pub async fn delete(pool: &DbPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tracks WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Attach post-processing artwork to an existing track.
    pub async fn set_thumbnail(
        pool: &DbPool,
        id: &str,
        thumbnail_path: &str,
        description: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tracks SET thumbnail_path = ?, thumbnail_description = ? WHERE id = ?",
        )
        .bind(thumbnail_path)
        .bind(description)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
