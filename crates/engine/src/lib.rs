//! Generation engine contract and its sidecar-process implementation.
//!
//! The scheduler is the only caller of [`GenerationEngine`]. The trait is
//! the seam that keeps the actual inference pipeline (an external, GPU-bound
//! process) out of the scheduling core: tests substitute a scripted engine,
//! production uses [`SidecarEngine`].

pub mod sidecar;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub use sidecar::{EngineConfig, SidecarEngine};

/// Decision returned by a checkpoint callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointControl {
    /// Keep generating.
    Continue,
    /// Stop as soon as possible; the engine must return
    /// [`EngineError::Interrupted`].
    Abort,
}

/// Checkpoint callback invoked by the engine with the cumulative number of
/// frames generated so far. Counts are monotonically non-decreasing.
pub type CheckpointFn<'a> = &'a (dyn Fn(u64) -> CheckpointControl + Send + Sync);

/// What the engine is asked to generate.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub lyrics: String,
    pub tags: String,
    pub max_audio_length_ms: u64,
    pub temperature: f32,
    pub topk: u32,
    pub cfg_scale: f32,
}

/// A finished artifact as reported by the engine.
#[derive(Debug, Clone)]
pub struct GeneratedTrack {
    /// Path of the written audio file (the `output` path passed in).
    pub audio_path: PathBuf,
    /// Actual duration of the produced audio.
    pub duration_ms: u64,
}

/// Errors from engine loading and generation.
///
/// `Interrupted` is deliberately distinct from `Generation`: it is the
/// cooperative-cancellation outcome, not a failure.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The model or device could not be initialized. Fatal for the job
    /// that triggered the load; retried on the next job.
    #[error("Model load failed: {0}")]
    ModelLoad(String),

    /// A checkpoint callback requested an abort and the engine stopped.
    #[error("Generation interrupted at a checkpoint")]
    Interrupted,

    /// The engine raised mid-run.
    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The exclusive generation device, seen through its driving process.
///
/// Implementations must invoke `on_checkpoint` synchronously with respect
/// to generation progress and must honor an `Abort` return by stopping and
/// returning [`EngineError::Interrupted`] rather than a generic failure.
#[async_trait]
pub trait GenerationEngine: Send + Sync {
    /// Perform the expensive one-time initialization (model load).
    ///
    /// Must be idempotent: after the first successful call, subsequent
    /// calls return `Ok(())` without redoing the work.
    async fn load(&self) -> Result<(), EngineError>;

    /// Whether a previous [`load`](Self::load) has completed successfully.
    /// Purely informational (status reporting); defaults to `false`.
    fn is_loaded(&self) -> bool {
        false
    }

    /// Generate audio for `request`, writing the artifact to `output`.
    async fn generate(
        &self,
        request: &GenerationRequest,
        output: &Path,
        on_checkpoint: CheckpointFn<'_>,
    ) -> Result<GeneratedTrack, EngineError>;
}
