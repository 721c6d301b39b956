//! `ResultStore` adapter over the track repository.

use std::path::Path;

use async_trait::async_trait;

use aria_core::types::JobId;
use aria_db::repositories::{NewTrack, TrackRepo};
use aria_db::DbPool;
use aria_scheduler::{JobResult, ResultStore, StoreError};

/// Persists completed generations into the `tracks` table.
pub struct SqliteResultStore {
    pool: DbPool,
}

impl SqliteResultStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResultStore for SqliteResultStore {
    async fn store(&self, result: &JobResult) -> Result<(), StoreError> {
        let track = NewTrack {
            id: result.id.to_string(),
            title: result.title.clone(),
            lyrics: result.lyrics.clone(),
            tags: result.tags.clone(),
            audio_path: result.audio_path.display().to_string(),
            duration_ms: result.duration_ms as i64,
            max_audio_length_ms: result.params.max_audio_length_ms as i64,
            temperature: f64::from(result.params.temperature),
            topk: i64::from(result.params.topk),
            cfg_scale: f64::from(result.params.cfg_scale),
            owner: result.owner.clone(),
            created_at: result.created_at,
        };
        TrackRepo::insert(&self.pool, &track)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn attach_thumbnail(
        &self,
        id: JobId,
        path: &Path,
        description: &str,
    ) -> Result<(), StoreError> {
        let updated = TrackRepo::set_thumbnail(
            &self.pool,
            &id.to_string(),
            &path.display().to_string(),
            description,
        )
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        if updated {
            Ok(())
        } else {
            Err(StoreError::Backend(format!("no track row for job {id}")))
        }
    }
}
