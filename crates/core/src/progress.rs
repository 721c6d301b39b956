//! Progress events emitted by the worker and fanned out to WebSocket
//! subscribers.

use serde::{Deserialize, Serialize};

use crate::job::JobStatus;
use crate::types::JobId;

/// WebSocket message type for an in-flight progress update.
pub const MSG_TYPE_JOB_PROGRESS: &str = "job_progress";

/// Job completed successfully.
pub const MSG_TYPE_JOB_COMPLETED: &str = "job_completed";

/// Job failed with an error.
pub const MSG_TYPE_JOB_FAILED: &str = "job_failed";

/// Job was cancelled.
pub const MSG_TYPE_JOB_CANCELLED: &str = "job_cancelled";

/// One progress event for one job.
///
/// Per job the stream of events carries non-decreasing `progress` values
/// and ends with exactly one terminal event (`Completed`, `Failed`, or
/// `Cancelled`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub id: JobId,
    pub status: JobStatus,
    /// Decoder frames generated so far.
    pub progress: u64,
    pub total_frames: u64,
    pub message: String,
}

impl ProgressUpdate {
    /// WebSocket message type string for this event's status.
    pub fn message_type(&self) -> &'static str {
        match self.status {
            JobStatus::Completed => MSG_TYPE_JOB_COMPLETED,
            JobStatus::Failed => MSG_TYPE_JOB_FAILED,
            JobStatus::Cancelled => MSG_TYPE_JOB_CANCELLED,
            _ => MSG_TYPE_JOB_PROGRESS,
        }
    }
}
