//! Progress dispatcher: the bridge between the scheduler's fan-out buffer
//! and WebSocket subscribers.
//!
//! Drains the buffer on a fixed interval and broadcasts each event to all
//! connected clients. Delivery is best-effort: there is no redelivery and
//! no acknowledgement, and a subscriber failure never affects the others.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use aria_core::job::JobStatus;
use aria_core::progress::ProgressUpdate;
use aria_core::types::JobId;
use aria_scheduler::Scheduler;

use crate::ws::WsManager;

/// How often the scheduler's progress buffer is drained.
const DISPATCH_INTERVAL: Duration = Duration::from_millis(100);

/// Wire format of a progress event as sent to WebSocket clients.
#[derive(Debug, Serialize)]
struct WsEvent<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    job_id: JobId,
    status: JobStatus,
    progress: u64,
    total_frames: u64,
    message: &'a str,
}

impl<'a> From<&'a ProgressUpdate> for WsEvent<'a> {
    fn from(update: &'a ProgressUpdate) -> Self {
        Self {
            kind: update.message_type(),
            job_id: update.id,
            status: update.status,
            progress: update.progress,
            total_frames: update.total_frames,
            message: &update.message,
        }
    }
}

/// Spawn the dispatcher task.
///
/// Runs until `cancel` fires, then performs one final drain so events
/// emitted just before shutdown still reach connected clients.
pub fn start_progress_dispatcher(
    scheduler: Arc<Scheduler>,
    ws_manager: Arc<WsManager>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(DISPATCH_INTERVAL);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    dispatch_pending(&scheduler, &ws_manager).await;
                    tracing::debug!("Progress dispatcher stopped");
                    return;
                }
                _ = interval.tick() => {
                    dispatch_pending(&scheduler, &ws_manager).await;
                }
            }
        }
    })
}

async fn dispatch_pending(scheduler: &Scheduler, ws_manager: &WsManager) {
    let updates = scheduler.progress().drain();
    for update in &updates {
        let event = WsEvent::from(update);
        match serde_json::to_string(&event) {
            Ok(json) => ws_manager.broadcast(Message::Text(json.into())).await,
            Err(e) => {
                tracing::error!(job_id = %update.id, error = %e, "Failed to serialize event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use aria_core::progress::MSG_TYPE_JOB_COMPLETED;

    #[test]
    fn event_wire_format() {
        let update = ProgressUpdate {
            id: uuid::Uuid::nil(),
            status: JobStatus::Completed,
            progress: 1500,
            total_frames: 1500,
            message: "Generation complete!".into(),
        };
        let json = serde_json::to_value(WsEvent::from(&update)).unwrap();
        assert_eq!(json["type"], MSG_TYPE_JOB_COMPLETED);
        assert_eq!(json["status"], "completed");
        assert_eq!(json["progress"], 1500);
        assert_eq!(json["message"], "Generation complete!");
    }
}
