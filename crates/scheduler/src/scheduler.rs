//! The scheduler object: admission queue, current-job slot, cancellation
//! registry, and the strictly-serial worker loop.

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use aria_core::job::{Job, JobSpec, JobStatus};
use aria_core::progress::ProgressUpdate;
use aria_core::types::JobId;
use aria_engine::{
    CheckpointControl, EngineError, GeneratedTrack, GenerationEngine, GenerationRequest,
};

use crate::progress::ProgressChannel;
use crate::store::{Enricher, JobResult, ResultStore};

/// Emit a progress event every this many frames (after the first).
const DEFAULT_PROGRESS_INTERVAL: u64 = 10;

/// Characters of lyrics handed to the post-processing collaborator.
const LYRICS_EXCERPT_CHARS: usize = 200;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Directory where generated audio (and artwork) files are written.
    pub output_dir: PathBuf,
    /// Frame interval between progress events.
    pub progress_interval: u64,
}

impl SchedulerConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// All mutable scheduling state, behind the one scheduler lock.
///
/// The lock is only held for short, bounded operations. It is never held
/// across an `.await` and never across the generation call, so status
/// reads and new submissions stay available throughout processing.
struct Inner {
    /// Pending jobs in FIFO admission order. Jobs cancelled while queued
    /// stay in place (already marked `Cancelled`) and are skipped lazily
    /// at dequeue.
    queue: VecDeque<Job>,
    /// The at-most-one job currently executing on the device. Cleared by
    /// the worker loop once the job's terminal handling has finished.
    current: Option<Job>,
    /// Ids for which cancellation has been requested. Consulted at
    /// dequeue time and at every engine checkpoint.
    cancelled: HashSet<JobId>,
    /// True while a worker task is alive. Tested and set under the same
    /// lock as enqueue so a worker observing an empty queue and a submit
    /// racing it can never strand a job.
    worker_running: bool,
}

/// Mediates access to the single exclusive generation device.
///
/// Shared by reference (`Arc`) between the serving layer and the worker
/// task. All public operations are lock-guarded and O(short).
pub struct Scheduler {
    inner: Mutex<Inner>,
    engine: Arc<dyn GenerationEngine>,
    store: Arc<dyn ResultStore>,
    enricher: Option<Arc<dyn Enricher>>,
    progress: ProgressChannel,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(
        engine: Arc<dyn GenerationEngine>,
        store: Arc<dyn ResultStore>,
        enricher: Option<Arc<dyn Enricher>>,
        config: SchedulerConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                current: None,
                cancelled: HashSet::new(),
                worker_running: false,
            }),
            engine,
            store,
            enricher,
            progress: ProgressChannel::new(),
            config,
        })
    }

    /// The progress fan-out buffer, drained by the serving layer's
    /// dispatcher.
    pub fn progress(&self) -> &ProgressChannel {
        &self.progress
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("scheduler lock poisoned")
    }

    // -----------------------------------------------------------------
    // Admission & queue operations
    // -----------------------------------------------------------------

    /// Admit a new job. O(1) append; parameter bounds are assumed to have
    /// been validated by the caller.
    ///
    /// The running-flag test and the enqueue sit under the same lock as
    /// the worker's exit check, so exactly one worker task is alive
    /// whenever the queue is non-empty.
    ///
    /// Must be called from within a Tokio runtime (the worker is a
    /// spawned task).
    pub fn submit(self: &Arc<Self>, spec: JobSpec) -> JobId {
        let job = Job::new(spec);
        let id = job.id;

        let spawn_worker = {
            let mut inner = self.lock();
            inner.queue.push_back(job);
            if inner.worker_running {
                false
            } else {
                inner.worker_running = true;
                true
            }
        };

        tracing::info!(job_id = %id, spawn_worker, "Job submitted");

        if spawn_worker {
            let scheduler = Arc::clone(self);
            tokio::spawn(async move { scheduler.run_worker().await });
        }

        id
    }

    /// Point-in-time snapshot of an actively tracked job, or `None` once
    /// the job has left active tracking (or never existed).
    pub fn status(&self, id: JobId) -> Option<Job> {
        let inner = self.lock();
        if let Some(current) = inner.current.as_ref() {
            if current.id == id {
                return Some(current.clone());
            }
        }
        inner.queue.iter().find(|job| job.id == id).cloned()
    }

    /// The currently-processing job (if any) first, then queued jobs in
    /// FIFO order.
    pub fn list_active(&self) -> Vec<Job> {
        let inner = self.lock();
        inner
            .current
            .iter()
            .chain(inner.queue.iter())
            .cloned()
            .collect()
    }

    /// Id of the currently-processing job, if any.
    pub fn active_id(&self) -> Option<JobId> {
        self.lock().current.as_ref().map(|job| job.id)
    }

    /// Number of jobs in active tracking (processing + queued).
    pub fn active_len(&self) -> usize {
        let inner = self.lock();
        inner.queue.len() + usize::from(inner.current.is_some())
    }

    /// Request cancellation.
    ///
    /// A job still queued transitions directly to `Cancelled` and never
    /// executes. The currently-processing job has the request recorded;
    /// termination is cooperative and lands at the engine's next
    /// checkpoint. Unknown or already-terminal ids return `false` and
    /// mutate nothing.
    pub fn cancel(&self, id: JobId) -> bool {
        let mut inner = self.lock();

        if let Some(job) = inner.queue.iter_mut().find(|job| job.id == id) {
            if job.status.is_terminal() {
                return false;
            }
            job.status = JobStatus::Cancelled;
            let update = ProgressUpdate {
                id,
                status: JobStatus::Cancelled,
                progress: job.progress,
                total_frames: job.total_frames,
                message: "Generation cancelled".into(),
            };
            inner.cancelled.insert(id);
            drop(inner);
            self.progress.push(update);
            tracing::info!(job_id = %id, "Queued job cancelled");
            return true;
        }

        let processing = inner
            .current
            .as_ref()
            .is_some_and(|job| job.id == id && !job.status.is_terminal());
        if processing {
            inner.cancelled.insert(id);
            drop(inner);
            tracing::info!(job_id = %id, "Cancellation requested for processing job");
            return true;
        }

        false
    }

    // -----------------------------------------------------------------
    // Worker loop
    // -----------------------------------------------------------------

    /// Drain the queue one job at a time. Exactly one instance of this
    /// task runs at any moment; it exits when the queue is observed empty
    /// under the lock, and the next `submit` restarts it.
    async fn run_worker(self: Arc<Self>) {
        tracing::debug!("Worker started");
        loop {
            let job = {
                let mut inner = self.lock();
                loop {
                    match inner.queue.pop_front() {
                        None => {
                            inner.worker_running = false;
                            tracing::debug!("Queue empty, worker stopping");
                            return;
                        }
                        Some(job) => {
                            // Cancelled while queued: already terminal,
                            // discard without executing.
                            if inner.cancelled.remove(&job.id) {
                                tracing::debug!(job_id = %job.id, "Skipping cancelled job");
                                continue;
                            }
                            let mut job = job;
                            job.status = JobStatus::Processing;
                            inner.current = Some(job.clone());
                            break job;
                        }
                    }
                }
            };

            Arc::clone(&self).process(job).await;

            // The job's terminal handling is done; drop it from active
            // tracking together with any stale cancellation flag.
            let mut inner = self.lock();
            if let Some(done) = inner.current.take() {
                inner.cancelled.remove(&done.id);
            }
        }
    }

    /// Execute one job end to end. Every exit path marks the current slot
    /// terminal and emits the single terminal event before returning.
    async fn process(self: Arc<Self>, job: Job) {
        let id = job.id;
        let total_frames = job.total_frames;

        self.progress.push(ProgressUpdate {
            id,
            status: JobStatus::Processing,
            progress: 0,
            total_frames,
            message: "Starting generation...".into(),
        });

        // Lazy engine initialization: expensive, at most once. A load
        // failure fails this job; the next job retries the load.
        if let Err(e) = self.engine.load().await {
            tracing::error!(job_id = %id, error = %e, "Engine initialization failed");
            self.finish_failed(format!("{e}"));
            return;
        }

        if let Err(e) = tokio::fs::create_dir_all(&self.config.output_dir).await {
            self.finish_failed(format!("Cannot create output directory: {e}"));
            return;
        }
        let output = self.config.output_dir.join(format!("{id}.wav"));

        let request = GenerationRequest {
            lyrics: job.lyrics.clone(),
            tags: job.tags.clone(),
            max_audio_length_ms: job.params.max_audio_length_ms,
            temperature: job.params.temperature,
            topk: job.params.topk,
            cfg_scale: job.params.cfg_scale,
        };

        // Sentinel meaning "no event emitted yet": the first checkpoint
        // always emits, later ones only on the frame interval.
        let last_emitted = AtomicU64::new(u64::MAX);
        let interval = self.config.progress_interval.max(1);
        let scheduler = Arc::clone(&self);

        let on_checkpoint = move |frames: u64| -> CheckpointControl {
            let abort = {
                let mut inner = scheduler.lock();
                if let Some(current) = inner.current.as_mut() {
                    if current.id == id {
                        current.progress = current.progress.max(frames);
                    }
                }
                inner.cancelled.contains(&id)
            };
            if abort {
                return CheckpointControl::Abort;
            }

            let prev = last_emitted.load(Ordering::Relaxed);
            let first = prev == u64::MAX;
            if (first || frames % interval == 0) && frames != prev {
                last_emitted.store(frames, Ordering::Relaxed);
                scheduler.progress.push(ProgressUpdate {
                    id,
                    status: JobStatus::Processing,
                    progress: frames,
                    total_frames,
                    message: format!("Generating frame {frames}/{total_frames}"),
                });
            }
            CheckpointControl::Continue
        };

        match self.engine.generate(&request, &output, &on_checkpoint).await {
            Ok(track) => self.finish_completed(track).await,
            Err(EngineError::Interrupted) => self.finish_cancelled(&output).await,
            Err(e) => {
                tracing::error!(job_id = %id, error = %e, "Generation failed");
                self.finish_failed(e.to_string());
            }
        }
    }

    /// Mark the current job terminal in place and return the updated
    /// snapshot. The slot itself is cleared by the worker loop once all
    /// terminal handling is done, so readers never see a gap between the
    /// terminal event and the job leaving active tracking.
    fn finish_current(&self, status: JobStatus, error: Option<String>) -> Option<Job> {
        let mut inner = self.lock();
        let job = inner.current.as_mut()?;
        job.status = status;
        if status == JobStatus::Completed {
            job.progress = job.total_frames;
        }
        if error.is_some() {
            job.error_message = error;
        }
        Some(job.clone())
    }

    async fn finish_completed(&self, track: GeneratedTrack) {
        let Some(snapshot) = self.status_of_current() else {
            return;
        };

        let result = JobResult {
            id: snapshot.id,
            title: snapshot.title.clone(),
            lyrics: snapshot.lyrics.clone(),
            tags: snapshot.tags.clone(),
            params: snapshot.params,
            audio_path: track.audio_path,
            duration_ms: track.duration_ms,
            owner: snapshot.owner.clone(),
            created_at: snapshot.created_at,
        };

        // Persist before announcing completion: a completed event implies
        // a stored result.
        if let Err(e) = self.store.store(&result).await {
            tracing::error!(job_id = %snapshot.id, error = %e, "Failed to persist result");
            self.finish_failed(format!("{e}"));
            return;
        }

        let Some(job) = self.finish_current(JobStatus::Completed, None) else {
            return;
        };
        self.progress.push(ProgressUpdate {
            id: job.id,
            status: JobStatus::Completed,
            progress: job.progress,
            total_frames: job.total_frames,
            message: "Generation complete!".into(),
        });
        tracing::info!(job_id = %job.id, duration_ms = result.duration_ms, "Job completed");

        self.enrich_best_effort(&job).await;
    }

    async fn finish_cancelled(&self, output: &std::path::Path) {
        // Cancelled results are discarded, including any partial artifact.
        match tokio::fs::remove_file(output).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(error = %e, "Failed to remove partial artifact");
            }
        }

        let Some(job) = self.finish_current(JobStatus::Cancelled, None) else {
            return;
        };
        self.progress.push(ProgressUpdate {
            id: job.id,
            status: JobStatus::Cancelled,
            progress: job.progress,
            total_frames: job.total_frames,
            message: "Generation cancelled".into(),
        });
        tracing::info!(job_id = %job.id, "Job cancelled at checkpoint");
    }

    fn finish_failed(&self, error: String) {
        let Some(job) = self.finish_current(JobStatus::Failed, Some(error.clone())) else {
            return;
        };
        self.progress.push(ProgressUpdate {
            id: job.id,
            status: JobStatus::Failed,
            progress: job.progress,
            total_frames: job.total_frames,
            message: format!("Error: {error}"),
        });
    }

    fn status_of_current(&self) -> Option<Job> {
        self.lock().current.clone()
    }

    /// Best-effort inline post-processing of a completed job. Any failure
    /// here is logged and isolated; the job stays `Completed`.
    async fn enrich_best_effort(&self, job: &Job) {
        let Some(enricher) = self.enricher.as_ref() else {
            return;
        };

        let excerpt: String = job.lyrics.chars().take(LYRICS_EXCERPT_CHARS).collect();
        let artwork = match enricher.enrich(&job.title, &job.tags, &excerpt).await {
            Ok(artwork) => artwork,
            Err(e) => {
                tracing::warn!(job_id = %job.id, error = %e, "Post-processing failed");
                return;
            }
        };

        let path = self.config.output_dir.join(format!("{}.png", job.id));
        if let Err(e) = tokio::fs::write(&path, &artwork.png).await {
            tracing::warn!(job_id = %job.id, error = %e, "Failed to write artwork");
            return;
        }

        if let Err(e) = self
            .store
            .attach_thumbnail(job.id, &path, &artwork.description)
            .await
        {
            tracing::warn!(job_id = %job.id, error = %e, "Failed to attach artwork");
        }
    }
}
