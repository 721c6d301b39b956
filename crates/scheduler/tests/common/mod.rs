//! Test doubles for the scheduler's collaborators: a scripted generation
//! engine, a recording result store, and a canned enricher.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use aria_core::types::JobId;
use aria_engine::{
    CheckpointControl, CheckpointFn, EngineError, GeneratedTrack, GenerationEngine,
    GenerationRequest,
};
use aria_scheduler::{Artwork, EnrichError, Enricher, JobResult, ResultStore, StoreError};

pub enum RunOutcome {
    Complete { duration_ms: u64 },
    Fail(String),
}

/// One scripted `generate` call: the checkpoint frame counts to report,
/// a delay between them, and the final outcome.
pub struct RunScript {
    pub checkpoints: Vec<u64>,
    pub step_delay: Duration,
    pub outcome: RunOutcome,
}

impl RunScript {
    pub fn completes(checkpoints: Vec<u64>) -> Self {
        Self {
            checkpoints,
            step_delay: Duration::from_millis(2),
            outcome: RunOutcome::Complete { duration_ms: 8_000 },
        }
    }

    pub fn fails(checkpoints: Vec<u64>, error: &str) -> Self {
        Self {
            checkpoints,
            step_delay: Duration::from_millis(2),
            outcome: RunOutcome::Fail(error.to_string()),
        }
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }
}

/// Scripted engine: each `generate` call consumes the next [`RunScript`].
///
/// Writes a placeholder artifact at the start of each run so cancellation
/// paths have a partial file to discard.
pub struct FakeEngine {
    scripts: Mutex<VecDeque<RunScript>>,
    load_failures: AtomicUsize,
    pub generate_calls: AtomicUsize,
}

impl FakeEngine {
    pub fn new(scripts: Vec<RunScript>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            load_failures: AtomicUsize::new(0),
            generate_calls: AtomicUsize::new(0),
        }
    }

    /// Make the next `count` load attempts fail with a model-load error.
    pub fn fail_loads(self, count: usize) -> Self {
        self.load_failures.store(count, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl GenerationEngine for FakeEngine {
    async fn load(&self) -> Result<(), EngineError> {
        let remaining = self.load_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.load_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(EngineError::ModelLoad("no GPU available".into()));
        }
        Ok(())
    }

    async fn generate(
        &self,
        _request: &GenerationRequest,
        output: &Path,
        on_checkpoint: CheckpointFn<'_>,
    ) -> Result<GeneratedTrack, EngineError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .expect("no script left for generate call");

        tokio::fs::write(output, b"partial").await?;

        for frames in script.checkpoints {
            if on_checkpoint(frames) == CheckpointControl::Abort {
                return Err(EngineError::Interrupted);
            }
            tokio::time::sleep(script.step_delay).await;
        }

        match script.outcome {
            RunOutcome::Complete { duration_ms } => Ok(GeneratedTrack {
                audio_path: output.to_path_buf(),
                duration_ms,
            }),
            RunOutcome::Fail(msg) => Err(EngineError::Generation(msg)),
        }
    }
}

/// Records every `store` / `attach_thumbnail` call; optionally fails.
#[derive(Default)]
pub struct RecordingStore {
    pub stored: Mutex<Vec<JobResult>>,
    pub thumbnails: Mutex<Vec<(JobId, String)>>,
    pub fail_store: std::sync::atomic::AtomicBool,
}

#[async_trait]
impl ResultStore for RecordingStore {
    async fn store(&self, result: &JobResult) -> Result<(), StoreError> {
        if self.fail_store.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk full".into()));
        }
        self.stored.lock().unwrap().push(result.clone());
        Ok(())
    }

    async fn attach_thumbnail(
        &self,
        id: JobId,
        path: &Path,
        _description: &str,
    ) -> Result<(), StoreError> {
        self.thumbnails
            .lock()
            .unwrap()
            .push((id, path.display().to_string()));
        Ok(())
    }
}

/// Enricher returning a fixed artwork, or failing on demand.
pub struct CannedEnricher {
    pub fail: bool,
}

#[async_trait]
impl Enricher for CannedEnricher {
    async fn enrich(
        &self,
        _title: &str,
        _tags: &str,
        _lyrics_excerpt: &str,
    ) -> Result<Artwork, EnrichError> {
        if self.fail {
            return Err(EnrichError::Failed("assistant unreachable".into()));
        }
        Ok(Artwork {
            png: vec![0x89, 0x50, 0x4e, 0x47],
            description: "album cover art".into(),
        })
    }
}
