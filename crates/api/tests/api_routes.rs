//! Router-level tests: each request goes through the real route tree and
//! handlers against an in-memory database and an instant fake engine.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use aria_api::config::ServerConfig;
use aria_api::persist::SqliteResultStore;
use aria_api::routes;
use aria_api::state::AppState;
use aria_api::ws::WsManager;
use aria_engine::{
    CheckpointFn, EngineError, GeneratedTrack, GenerationEngine, GenerationRequest,
};
use aria_scheduler::{Scheduler, SchedulerConfig};

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Engine that "generates" a tiny artifact immediately.
struct InstantEngine;

#[async_trait]
impl GenerationEngine for InstantEngine {
    async fn load(&self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        output: &Path,
        on_checkpoint: CheckpointFn<'_>,
    ) -> Result<GeneratedTrack, EngineError> {
        tokio::fs::write(output, b"RIFF....WAVE").await?;
        on_checkpoint(request.max_audio_length_ms / 80);
        Ok(GeneratedTrack {
            audio_path: output.to_path_buf(),
            duration_ms: request.max_audio_length_ms,
        })
    }
}

struct Harness {
    app: Router,
    // Held so generated artifacts stay on disk for the test's duration.
    _output_dir: tempfile::TempDir,
}

async fn harness() -> Harness {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    aria_db::run_migrations(&pool).await.expect("migrations");

    let output_dir = tempfile::tempdir().expect("tempdir");

    let engine: Arc<dyn GenerationEngine> = Arc::new(InstantEngine);
    let scheduler = Scheduler::new(
        Arc::clone(&engine),
        Arc::new(SqliteResultStore::new(pool.clone())),
        None,
        SchedulerConfig::new(output_dir.path()),
    );

    let config = ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        cors_origins: vec![],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        output_dir: output_dir.path().to_path_buf(),
    };

    let state = AppState {
        pool,
        config: Arc::new(config),
        scheduler,
        engine,
        ws_manager: Arc::new(WsManager::new()),
        assistant: None,
    };

    let app = Router::new()
        .merge(routes::health::router())
        .merge(routes::ws_routes())
        .nest("/api", routes::api_routes())
        .with_state(state);

    Harness {
        app,
        _output_dir: output_dir,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.expect("request failed");
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Poll `/api/history` until it reports `count` tracks.
async fn wait_for_history(app: &Router, count: i64) {
    tokio::time::timeout(WAIT_TIMEOUT, async {
        loop {
            let (status, json) = send(app, get("/api/history")).await;
            assert_eq!(status, StatusCode::OK);
            if json["data"]["total"] == serde_json::json!(count) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("track never reached history");
}

#[tokio::test]
async fn health_reports_ok() {
    let h = harness().await;
    let (status, json) = send(&h.app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["db_healthy"], true);
}

#[tokio::test]
async fn generate_rejects_out_of_range_params() {
    let h = harness().await;
    let (status, json) = send(
        &h.app,
        post_json(
            "/api/generate",
            serde_json::json!({
                "lyrics": "la la la",
                "tags": "lofi",
                "params": {
                    "max_audio_length_ms": 120_000,
                    "temperature": 9.0,
                    "topk": 50,
                    "cfg_scale": 1.5
                }
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn generate_rejects_empty_lyrics() {
    let h = harness().await;
    let (status, _) = send(
        &h.app,
        post_json(
            "/api/generate",
            serde_json::json!({ "lyrics": "", "tags": "lofi" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generate_then_browse_history_and_audio() {
    let h = harness().await;

    let (status, json) = send(
        &h.app,
        post_json(
            "/api/generate",
            serde_json::json!({
                "title": "Test Track",
                "lyrics": "verse one",
                "tags": "lofi, piano"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["total_frames"], 1500);
    let id = json["data"]["id"].as_str().unwrap().to_string();

    wait_for_history(&h.app, 1).await;

    // The finished track is browsable.
    let (status, json) = send(&h.app, get(&format!("/api/history/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["title"], "Test Track");
    assert_eq!(json["data"]["duration_ms"], 120_000);

    // Its audio artifact is served.
    let response = h
        .app
        .clone()
        .oneshot(get(&format!("/api/audio/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "audio/wav"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..4], b"RIFF");

    // No artwork without an enricher.
    let (status, _) = send(&h.app, get(&format!("/api/thumbnail/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Delete removes the row.
    let (status, _) = send(&h.app, delete(&format!("/api/history/{id}"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&h.app, get(&format!("/api/history/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn queue_rejects_unknown_ids() {
    let h = harness().await;
    let id = uuid::Uuid::new_v4();

    let (status, json) = send(&h.app, get(&format!("/api/queue/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");

    let (status, _) = send(&h.app, delete(&format!("/api/queue/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn queue_listing_is_empty_when_idle() {
    let h = harness().await;
    let (status, json) = send(&h.app, get("/api/queue")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["active_id"], serde_json::Value::Null);
    assert_eq!(json["data"]["jobs"], serde_json::json!([]));
}

#[tokio::test]
async fn status_reports_engine_and_assistant() {
    let h = harness().await;
    let (status, json) = send(&h.app, get("/api/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["engine_loaded"], false);
    assert_eq!(json["data"]["queue_length"], 0);
    assert_eq!(json["data"]["assistant_configured"], false);
}

#[tokio::test]
async fn assistant_endpoint_unavailable_without_key() {
    let h = harness().await;
    let (status, json) = send(
        &h.app,
        post_json("/api/assistant/lyrics", serde_json::json!({ "theme": "rain" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "ASSISTANT_UNCONFIGURED");
}

#[tokio::test]
async fn history_search_filters_results() {
    let h = harness().await;

    for (title, tags) in [("Morning Rain", "lofi"), ("Night Drive", "synthwave")] {
        let (status, _) = send(
            &h.app,
            post_json(
                "/api/generate",
                serde_json::json!({ "title": title, "lyrics": "words", "tags": tags }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    wait_for_history(&h.app, 2).await;

    let (status, json) = send(&h.app, get("/api/history?search=Rain")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["items"][0]["title"], "Morning Rain");
}
