//! Job entity: one generation request tracked from admission to a
//! terminal state.

use serde::{Deserialize, Serialize};

use crate::params::GenerationParams;
use crate::types::{JobId, Timestamp};

/// Lifecycle states for a generation job.
///
/// A job is created `Pending`, becomes `Processing` only when the worker
/// dequeues it, and reaches exactly one of the three terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Admitted, waiting in the queue.
    #[default]
    Pending,
    /// Currently executing on the generation device.
    Processing,
    /// Generation finished and the result was handed to persistence.
    Completed,
    /// The engine raised an error mid-run.
    Failed,
    /// Cancellation was requested and honored.
    Cancelled,
}

impl JobStatus {
    /// Returns true for `Completed`, `Failed`, and `Cancelled`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// Specification for a new job, as accepted by `Scheduler::submit`.
///
/// Parameter bounds are the caller's responsibility (validated at the API
/// edge before admission).
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub title: Option<String>,
    pub lyrics: String,
    pub tags: String,
    pub params: GenerationParams,
    pub owner: Option<String>,
}

/// A generation job and its mutable state.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub lyrics: String,
    pub tags: String,
    pub params: GenerationParams,
    pub status: JobStatus,
    /// Decoder frames generated so far.
    pub progress: u64,
    /// Total frames expected for this job's parameters.
    pub total_frames: u64,
    pub created_at: Timestamp,
    pub owner: Option<String>,
    pub error_message: Option<String>,
}

impl Job {
    /// Create a new `Pending` job from a spec, minting a fresh id.
    ///
    /// An absent title defaults to `Generation <id-prefix>`, matching the
    /// behaviour users see in the queue view.
    pub fn new(spec: JobSpec) -> Self {
        let id = uuid::Uuid::new_v4();
        let title = spec
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("Generation {}", &id.to_string()[..8]));
        let total_frames = spec.params.total_frames();

        Self {
            id,
            title,
            lyrics: spec.lyrics,
            tags: spec.tags,
            params: spec.params,
            status: JobStatus::Pending,
            progress: 0,
            total_frames,
            created_at: chrono::Utc::now(),
            owner: spec.owner,
            error_message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> JobSpec {
        JobSpec {
            title: None,
            lyrics: "la la la".into(),
            tags: "lofi, piano".into(),
            params: GenerationParams::default(),
            owner: None,
        }
    }

    #[test]
    fn new_job_is_pending_with_zero_progress() {
        let job = Job::new(spec());
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress, 0);
        assert_eq!(job.total_frames, 1500);
        assert!(job.error_message.is_none());
    }

    #[test]
    fn missing_title_gets_id_prefix_default() {
        let job = Job::new(spec());
        let prefix = &job.id.to_string()[..8];
        assert_eq!(job.title, format!("Generation {prefix}"));
    }

    #[test]
    fn explicit_title_is_kept() {
        let job = Job::new(JobSpec {
            title: Some("Midnight Drive".into()),
            ..spec()
        });
        assert_eq!(job.title, "Midnight Drive");
    }

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }
}
