use std::sync::Arc;

use aria_engine::GenerationEngine;
use aria_scheduler::Scheduler;

use crate::assistant::OpenAiClient;
use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: aria_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The scheduling core mediating the generation device.
    pub scheduler: Arc<Scheduler>,
    /// The generation engine, kept for status reporting.
    pub engine: Arc<dyn GenerationEngine>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
    /// OpenAI-backed lyric assistant; `None` when no API key is configured.
    pub assistant: Option<Arc<OpenAiClient>>,
}
