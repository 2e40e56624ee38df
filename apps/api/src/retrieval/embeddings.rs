//! Text embeddings for the vector store.
//!
//! Chroma's REST API stores and compares vectors but does not compute them,
//! so every document and query is embedded here before it is sent.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::{EmbeddingConfig, EmbeddingKind};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding configuration error: {0}")]
    Configuration(String),

    #[error("Embedding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),
}

/// Turns text into a dense vector. Documents and queries must go through the
/// same embedder for their distances to be comparable.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Builds the embedder selected by `EMBEDDING_SERVICE`.
///
/// A missing key is not a startup error: the service still boots and each
/// embedding call reports the configuration problem instead.
pub fn configure(cfg: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    let client = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| EmbeddingError::Configuration(format!("Failed to build HTTP client: {e}")))?;

    let embedder: Arc<dyn Embedder> = match cfg.kind {
        EmbeddingKind::Gemini => Arc::new(GeminiEmbeddings {
            client,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        }),
        EmbeddingKind::OpenAi => Arc::new(OpenAiEmbeddings {
            client,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        }),
    };
    info!(
        "Embeddings: {} ({})",
        cfg.kind.as_str(),
        embedder.model_name()
    );
    Ok(embedder)
}

fn require_key<'a>(key: &'a Option<String>, provider: &str) -> Result<&'a str, EmbeddingError> {
    key.as_deref().ok_or_else(|| {
        EmbeddingError::Configuration(format!("{provider} API key is not configured"))
    })
}

async fn read_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, EmbeddingError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(EmbeddingError::Api {
            status: status.as_u16(),
            message,
        });
    }
    response
        .json()
        .await
        .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini (embedContent)
// ────────────────────────────────────────────────────────────────────────────

pub struct GeminiEmbeddings {
    client: Client,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Serialize)]
struct GeminiEmbedRequest<'a> {
    model: String,
    content: GeminiContent<'a>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: [GeminiPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeminiEmbedResponse {
    embedding: GeminiValues,
}

#[derive(Debug, Deserialize)]
struct GeminiValues {
    values: Vec<f32>,
}

impl GeminiEmbeddings {
    fn request<'a>(&self, text: &'a str) -> GeminiEmbedRequest<'a> {
        GeminiEmbedRequest {
            model: format!("models/{}", self.model),
            content: GeminiContent {
                parts: [GeminiPart { text }],
            },
        }
    }
}

#[async_trait]
impl Embedder for GeminiEmbeddings {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let api_key = require_key(&self.api_key, "Gemini")?;
        let url = format!("{GEMINI_API_BASE}/models/{}:embedContent", self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&self.request(text))
            .send()
            .await?;

        let parsed: GeminiEmbedResponse = read_json(response).await?;
        non_empty(parsed.embedding.values)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// OpenAI (/v1/embeddings)
// ────────────────────────────────────────────────────────────────────────────

pub struct OpenAiEmbeddings {
    client: Client,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Serialize)]
struct OpenAiEmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    #[serde(default)]
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAiEmbeddings {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let api_key = require_key(&self.api_key, "OpenAI")?;
        let request = OpenAiEmbeddingRequest {
            model: &self.model,
            input: [text],
        };

        let response = self
            .client
            .post(OPENAI_EMBEDDINGS_URL)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let parsed: OpenAiEmbeddingResponse = read_json(response).await?;
        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .unwrap_or_default();
        non_empty(embedding)
    }
}

fn non_empty(values: Vec<f32>) -> Result<Vec<f32>, EmbeddingError> {
    if values.is_empty() {
        return Err(EmbeddingError::InvalidResponse(
            "provider returned an empty embedding".to_string(),
        ));
    }
    Ok(values)
}
