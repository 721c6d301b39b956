//! HTTP/WebSocket surface over the scheduling core.
//!
//! Handlers are thin translators: validation at the edge, then a direct
//! call into the scheduler or the track repository. Real-time progress
//! reaches browsers through the dispatcher task, which drains the
//! scheduler's buffer on a fixed interval and broadcasts to every
//! WebSocket subscriber.

pub mod assistant;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod persist;
pub mod response;
pub mod routes;
pub mod state;
pub mod ws;
