//! Sidecar-process engine implementation.
//!
//! Drives the inference pipeline as a child process and speaks a small
//! line protocol on its stdout:
//!
//! ```text
//! FRAME <n>      checkpoint: n cumulative decoder frames generated
//! DONE <ms>      generation finished; artifact duration in milliseconds
//! ```
//!
//! Anything else on stdout is ignored. On abort the child is killed and
//! the call returns [`EngineError::Interrupted`]; the partial artifact is
//! left on disk for the caller to discard.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::OnceCell;

use crate::{
    CheckpointControl, CheckpointFn, EngineError, GeneratedTrack, GenerationEngine,
    GenerationRequest,
};

/// Maximum stderr captured per run. Output past this is dropped.
const MAX_STDERR_BYTES: usize = 64 * 1024;

/// Configuration for the sidecar engine, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path of the inference command (default: `aria-infer`).
    pub command: PathBuf,
    /// Model checkpoint directory passed as `--model-dir` (default: `./ckpt`).
    pub model_dir: PathBuf,
}

impl EngineConfig {
    /// Load from `ARIA_ENGINE_CMD` and `ARIA_MODEL_DIR` with defaults.
    pub fn from_env() -> Self {
        let command = std::env::var("ARIA_ENGINE_CMD")
            .unwrap_or_else(|_| "aria-infer".into())
            .into();
        let model_dir = std::env::var("ARIA_MODEL_DIR")
            .unwrap_or_else(|_| "./ckpt".into())
            .into();
        Self { command, model_dir }
    }
}

/// [`GenerationEngine`] backed by a child inference process.
pub struct SidecarEngine {
    config: EngineConfig,
    loaded: OnceCell<()>,
}

impl SidecarEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            loaded: OnceCell::new(),
        }
    }

    fn base_command(&self) -> Command {
        let mut cmd = Command::new(&self.config.command);
        cmd.arg("--model-dir").arg(&self.config.model_dir);
        cmd
    }
}

#[async_trait]
impl GenerationEngine for SidecarEngine {
    async fn load(&self) -> Result<(), EngineError> {
        self.loaded
            .get_or_try_init(|| async {
                let output = self
                    .base_command()
                    .arg("--load-only")
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::piped())
                    .kill_on_drop(true)
                    .output()
                    .await?;

                if output.status.success() {
                    tracing::info!(model_dir = %self.config.model_dir.display(), "Model loaded");
                    Ok(())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(EngineError::ModelLoad(stderr.trim().to_string()))
                }
            })
            .await
            .map(|_| ())
    }

    fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        output: &Path,
        on_checkpoint: CheckpointFn<'_>,
    ) -> Result<GeneratedTrack, EngineError> {
        let mut cmd = self.base_command();
        cmd.arg("--output")
            .arg(output)
            .arg("--max-audio-length-ms")
            .arg(request.max_audio_length_ms.to_string())
            .arg("--temperature")
            .arg(request.temperature.to_string())
            .arg("--topk")
            .arg(request.topk.to_string())
            .arg("--cfg-scale")
            .arg(request.cfg_scale.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;

        // Lyrics and tags go over stdin as JSON so the command line stays
        // free of user text.
        if let Some(mut stdin) = child.stdin.take() {
            let payload = serde_json::json!({
                "lyrics": request.lyrics,
                "tags": request.tags,
            });
            let bytes = serde_json::to_vec(&payload).unwrap_or_default();
            // Best-effort write; a process that closes stdin early will
            // fail on its own terms below.
            let _ = stdin.write_all(&bytes).await;
            drop(stdin);
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Generation("child stdout not captured".into()))?;
        let stderr = child.stderr.take();

        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut handle) = stderr {
                let _ = (&mut handle)
                    .take(MAX_STDERR_BYTES as u64)
                    .read_to_end(&mut buf)
                    .await;
            }
            String::from_utf8_lossy(&buf).into_owned()
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut duration_ms: Option<u64> = None;

        while let Some(line) = lines.next_line().await? {
            if let Some(rest) = line.strip_prefix("FRAME ") {
                let Ok(frames) = rest.trim().parse::<u64>() else {
                    continue;
                };
                if on_checkpoint(frames) == CheckpointControl::Abort {
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    stderr_task.abort();
                    return Err(EngineError::Interrupted);
                }
            } else if let Some(rest) = line.strip_prefix("DONE ") {
                duration_ms = rest.trim().parse::<u64>().ok();
            }
        }

        let status = child.wait().await?;
        let stderr_text = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let detail = if stderr_text.trim().is_empty() {
                format!("engine exited with {status}")
            } else {
                stderr_text.trim().to_string()
            };
            return Err(EngineError::Generation(detail));
        }

        let duration_ms = duration_ms.unwrap_or(request.max_audio_length_ms);
        Ok(GeneratedTrack {
            audio_path: output.to_path_buf(),
            duration_ms,
        })
    }
}
