//! OpenAI backend.

use async_trait::async_trait;

use super::chat_completions::ChatCompletionsClient;
use super::{require_api_key, LlmError, ModelBackend};
use crate::config::BackendConfig;
use crate::models::conversation::AssembledPrompt;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
/// Used when the configured model is not an OpenAI model name.
pub const FALLBACK_MODEL: &str = "gpt-3.5-turbo";

/// Keeps `model` if it follows OpenAI naming, otherwise substitutes the fallback.
/// The model setting is shared across providers, so a Gemini name can reach here.
pub fn normalize_model(model: &str) -> &str {
    if model.starts_with("gpt") {
        model
    } else {
        FALLBACK_MODEL
    }
}

pub struct OpenAiBackend {
    inner: ChatCompletionsClient,
}

impl OpenAiBackend {
    pub fn configure(cfg: &BackendConfig) -> Result<Self, LlmError> {
        let api_key = require_api_key(cfg, "OpenAI")?.to_string();
        let model = normalize_model(&cfg.model).to_string();
        Ok(Self {
            inner: ChatCompletionsClient::new(OPENAI_API_BASE, api_key, model, cfg)?,
        })
    }
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "OpenAI"
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn send(&self, prompt: &AssembledPrompt) -> Result<String, LlmError> {
        self.inner.complete(prompt).await
    }
}
