//! OpenAI-backed creative assistant: lyric drafting for the compose view
//! and artwork generation for finished tracks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use aria_scheduler::{Artwork, EnrichError, Enricher};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";

const LYRICS_SYSTEM_PROMPT: &str = "You are a songwriting assistant for an \
AI music generator. Reply with a JSON object containing exactly three \
string fields: \"title\", \"lyrics\" (with [verse]/[chorus] section \
markers), and \"tags\" (comma-separated genre and mood descriptors).";

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream error: {0}")]
    Api(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// What the user asks the assistant for.
#[derive(Debug, Deserialize)]
pub struct LyricsPrompt {
    /// Free-text theme, e.g. "a rainy night in the city".
    pub theme: String,
    /// Optional style hints merged into the prompt.
    pub style: Option<String>,
}

/// A drafted song: title, sectioned lyrics, and style tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LyricsDraft {
    pub title: String,
    pub lyrics: String,
    pub tags: String,
}

/// Thin client for the OpenAI HTTP API.
///
/// Constructed only when `OPENAI_API_KEY` is set; everything that depends
/// on it degrades gracefully when absent.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    image_model: String,
}

impl OpenAiClient {
    /// Build from environment variables. Returns `None` without
    /// `OPENAI_API_KEY`.
    ///
    /// | Env Var            | Default                     |
    /// |--------------------|-----------------------------|
    /// | `OPENAI_API_KEY`   | (required)                  |
    /// | `OPENAI_BASE_URL`  | `https://api.openai.com/v1` |
    /// | `OPENAI_MODEL`     | `gpt-4o-mini`               |
    /// | `OPENAI_IMAGE_MODEL` | `dall-e-3`                |
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        Some(Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.into()),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
            image_model: std::env::var("OPENAI_IMAGE_MODEL")
                .unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.into()),
        })
    }

    /// Draft a title, lyrics, and tags for the given theme.
    pub async fn draft_lyrics(&self, prompt: &LyricsPrompt) -> Result<LyricsDraft, AssistantError> {
        let mut user_prompt = format!("Write a song about: {}", prompt.theme);
        if let Some(style) = prompt.style.as_deref().filter(|s| !s.trim().is_empty()) {
            user_prompt.push_str(&format!("\nStyle: {style}"));
        }

        let body = json!({
            "model": self.model,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": LYRICS_SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt },
            ],
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AssistantError::Api(format!("{status}: {text}")));
        }

        let completion: ChatCompletion = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AssistantError::Malformed("empty choices".into()))?;

        serde_json::from_str(&content)
            .map_err(|e| AssistantError::Malformed(format!("draft is not valid JSON: {e}")))
    }

    /// Generate cover artwork for a finished track. Returns PNG bytes and
    /// the prompt used, for display alongside the image.
    pub async fn generate_artwork(
        &self,
        title: &str,
        tags: &str,
        lyrics_excerpt: &str,
    ) -> Result<Artwork, AssistantError> {
        let prompt = format!(
            "Album cover art for a song titled \"{title}\". \
             Style: {tags}. Mood from the lyrics: {lyrics_excerpt}. \
             No text or lettering in the image."
        );

        let body = json!({
            "model": self.image_model,
            "prompt": prompt,
            "n": 1,
            "size": "1024x1024",
        });

        let response = self
            .http
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AssistantError::Api(format!("{status}: {text}")));
        }

        let images: ImageGeneration = response.json().await?;
        let url = images
            .data
            .into_iter()
            .next()
            .map(|d| d.url)
            .ok_or_else(|| AssistantError::Malformed("no image returned".into()))?;

        let png = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?
            .to_vec();

        Ok(Artwork {
            png,
            description: prompt,
        })
    }
}

#[async_trait]
impl Enricher for OpenAiClient {
    async fn enrich(
        &self,
        title: &str,
        tags: &str,
        lyrics_excerpt: &str,
    ) -> Result<Artwork, EnrichError> {
        self.generate_artwork(title, tags, lyrics_excerpt)
            .await
            .map_err(|e| EnrichError::Failed(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ImageGeneration {
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    url: String,
}
