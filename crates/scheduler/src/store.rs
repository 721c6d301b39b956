//! Collaborator contracts consumed by the worker loop.
//!
//! The scheduler defines these seams; the api crate provides the
//! SQLite-backed [`ResultStore`] and the OpenAI-backed [`Enricher`], and
//! tests substitute recording fakes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use aria_core::params::GenerationParams;
use aria_core::types::{JobId, Timestamp};

/// A finished generation, handed to persistence exactly once per
/// completed job. Failed and cancelled jobs never produce one.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub id: JobId,
    pub title: String,
    pub lyrics: String,
    pub tags: String,
    pub params: GenerationParams,
    pub audio_path: PathBuf,
    pub duration_ms: u64,
    pub owner: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Persistence failed: {0}")]
    Backend(String),
}

/// Persistence collaborator for finished results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Store a completed job's result.
    async fn store(&self, result: &JobResult) -> Result<(), StoreError>;

    /// Attach post-processing artwork to an already stored result.
    async fn attach_thumbnail(
        &self,
        id: JobId,
        path: &Path,
        description: &str,
    ) -> Result<(), StoreError>;
}

/// Artwork produced by post-processing.
#[derive(Debug, Clone)]
pub struct Artwork {
    pub png: Vec<u8>,
    pub description: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("Enrichment failed: {0}")]
    Failed(String),
}

/// Post-processing collaborator, invoked at most once per completed job.
/// Failures are logged and isolated; they never change a job's terminal
/// status.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(
        &self,
        title: &str,
        tags: &str,
        lyrics_excerpt: &str,
    ) -> Result<Artwork, EnrichError>;
}
