//! Job scheduling for the single exclusive generation device.
//!
//! One [`Scheduler`] owns all mutable scheduling state: the FIFO admission
//! queue, the single currently-executing slot, and the cancellation
//! registry, guarded by one lock that is only ever held for short, bounded
//! operations. A single worker task drains the queue strictly serially and
//! is the only caller of the [`GenerationEngine`](aria_engine::GenerationEngine)
//! collaborator. Progress flows out through an unbounded, non-blocking
//! [`ProgressChannel`] drained by the serving layer.

pub mod progress;
pub mod store;

mod scheduler;

pub use progress::ProgressChannel;
pub use scheduler::{Scheduler, SchedulerConfig};
pub use store::{Artwork, EnrichError, Enricher, JobResult, ResultStore, StoreError};
