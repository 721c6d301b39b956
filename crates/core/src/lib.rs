//! Shared domain types for the Aria music generation backend.
//!
//! Everything here is plain data: the job model, generation parameters,
//! progress events, and the domain error type. No I/O, no async.

pub mod error;
pub mod job;
pub mod params;
pub mod progress;
pub mod types;
