//! Thread-safe buffer bridging worker-side progress events to the serving
//! layer.
//!
//! The worker pushes; a dispatcher task on the serving side drains on a
//! fixed short interval and fans out to subscribers. The buffer is
//! unbounded and never applies backpressure, so a slow or absent
//! subscriber can never stall generation. Delivery past this buffer is
//! best-effort: no redelivery, no acknowledgement.

use std::sync::Mutex;

use aria_core::progress::ProgressUpdate;

/// Unbounded buffer of pending progress events.
pub struct ProgressChannel {
    buffer: Mutex<Vec<ProgressUpdate>>,
}

impl ProgressChannel {
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(Vec::new()),
        }
    }

    /// Append an event. Never blocks beyond the buffer lock.
    pub fn push(&self, update: ProgressUpdate) {
        self.buffer
            .lock()
            .expect("progress buffer lock poisoned")
            .push(update);
    }

    /// Take all buffered events, leaving the buffer empty.
    pub fn drain(&self) -> Vec<ProgressUpdate> {
        std::mem::take(
            &mut *self
                .buffer
                .lock()
                .expect("progress buffer lock poisoned"),
        )
    }

    /// Number of events currently buffered.
    pub fn len(&self) -> usize {
        self.buffer
            .lock()
            .expect("progress buffer lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ProgressChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aria_core::job::JobStatus;

    fn update(progress: u64) -> ProgressUpdate {
        ProgressUpdate {
            id: uuid::Uuid::new_v4(),
            status: JobStatus::Processing,
            progress,
            total_frames: 100,
            message: String::new(),
        }
    }

    #[test]
    fn drain_returns_events_in_push_order_and_empties() {
        let channel = ProgressChannel::new();
        channel.push(update(1));
        channel.push(update(2));
        channel.push(update(3));

        let drained = channel.drain();
        assert_eq!(
            drained.iter().map(|u| u.progress).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(channel.is_empty());
        assert!(channel.drain().is_empty());
    }
}
