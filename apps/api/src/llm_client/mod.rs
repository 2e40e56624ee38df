/// LLM Client — the single point of entry for hosted model calls.
///
/// Three interchangeable providers sit behind `ModelBackend`. The provider is
/// chosen once at startup (`AI_SERVICE`) and wrapped in a `BackendHandle`,
/// which builds the provider client lazily on first use and shares it for the
/// rest of the process.
///
/// There are no retries and no cross-provider failover: one attempt per call.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::{BackendConfig, BackendKind};
use crate::models::conversation::AssembledPrompt;

mod chat_completions;
pub mod gemini;
pub mod openai;
pub mod openrouter;

use self::gemini::GeminiBackend;
use self::openai::OpenAiBackend;
use self::openrouter::OpenRouterBackend;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Authentication failed (status {status}): {message}")]
    Authentication { status: u16, message: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

impl LlmError {
    /// Classifies a transport failure, keeping timeouts distinct.
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(timeout)
        } else {
            LlmError::Http(err)
        }
    }

    /// Classifies a non-success HTTP status returned by a provider.
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => LlmError::Authentication { status, message },
            _ => LlmError::Api { status, message },
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, LlmError::Configuration(_))
    }
}

/// A hosted language-model provider.
///
/// Implementations hold only immutable client state, so one instance is
/// shared across all in-flight requests.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Provider name used in logs.
    fn name(&self) -> &'static str;

    /// Model identifier actually sent to the provider.
    fn model(&self) -> &str;

    /// Submits the prompt and returns the generated text.
    async fn send(&self, prompt: &AssembledPrompt) -> Result<String, LlmError>;
}

/// Returns the configured credential, rejecting missing or blank keys.
pub(crate) fn require_api_key<'a>(
    cfg: &'a BackendConfig,
    provider: &str,
) -> Result<&'a str, LlmError> {
    cfg.api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| LlmError::Configuration(format!("{provider} API key is not configured")))
}

/// Builds the shared HTTP client used by a provider.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::Configuration(format!("Failed to build HTTP client: {e}")))
}

/// Constructs the provider client for `kind`.
pub fn configure(kind: BackendKind, cfg: &BackendConfig) -> Result<Arc<dyn ModelBackend>, LlmError> {
    let backend: Arc<dyn ModelBackend> = match kind {
        BackendKind::Gemini => Arc::new(GeminiBackend::configure(cfg)?),
        BackendKind::OpenAi => Arc::new(OpenAiBackend::configure(cfg)?),
        BackendKind::OpenRouter => Arc::new(OpenRouterBackend::configure(cfg)?),
    };
    info!(
        "{} backend initialized (model: {}, max tokens: {})",
        backend.name(),
        backend.model(),
        cfg.max_output_tokens
    );
    Ok(backend)
}

/// Resolved handle to the active backend.
///
/// The provider client is constructed on first use. Concurrent first calls
/// race on a `OnceCell`, so construction happens at most once. A failed
/// construction leaves the cell empty and the next request tries again.
pub struct BackendHandle {
    kind: BackendKind,
    config: BackendConfig,
    backend: OnceCell<Arc<dyn ModelBackend>>,
}

impl BackendHandle {
    pub fn new(kind: BackendKind, config: BackendConfig) -> Self {
        Self {
            kind,
            config,
            backend: OnceCell::new(),
        }
    }

    /// Wraps an already constructed backend.
    pub fn with_backend(
        kind: BackendKind,
        config: BackendConfig,
        backend: Arc<dyn ModelBackend>,
    ) -> Self {
        Self {
            kind,
            config,
            backend: OnceCell::new_with(Some(backend)),
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.initialized()
    }

    async fn backend(&self) -> Result<&Arc<dyn ModelBackend>, LlmError> {
        self.backend
            .get_or_try_init(|| async { configure(self.kind, &self.config) })
            .await
    }

    /// Sends the prompt under the configured hard timeout.
    pub async fn send(&self, prompt: &AssembledPrompt) -> Result<String, LlmError> {
        let backend = self.backend().await?;
        let timeout = self.config.request_timeout;

        debug!(
            "Dispatching {} turns ({} chars) to {} ({})",
            prompt.len(),
            prompt.char_count(),
            backend.name(),
            backend.model()
        );

        match tokio::time::timeout(timeout, backend.send(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(timeout)),
        }
    }
}
