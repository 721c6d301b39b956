pub mod assistant;
pub mod generate;
pub mod health;
pub mod history;
pub mod queue;
pub mod status;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api` route tree.
///
/// ```text
/// POST   /generate          submit a generation job
/// GET    /queue             active jobs (processing first, then FIFO)
/// GET    /queue/{id}        job snapshot
/// DELETE /queue/{id}        request cancellation
/// GET    /status            system status
/// GET    /history           finished tracks (search + pagination)
/// GET    /history/{id}      one finished track
/// DELETE /history/{id}      delete a finished track
/// GET    /audio/{id}        serve the audio artifact
/// GET    /thumbnail/{id}    serve the artwork
/// POST   /assistant/lyrics  draft title/lyrics/tags
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(generate::router())
        .merge(queue::router())
        .merge(status::router())
        .merge(history::router())
        .merge(assistant::router())
}

/// WebSocket routes mounted at the root (outside `/api`).
///
/// ```text
/// GET /ws/progress   progress event subscription
/// ```
pub fn ws_routes() -> Router<AppState> {
    Router::new().route("/ws/progress", get(ws::ws_handler))
}
