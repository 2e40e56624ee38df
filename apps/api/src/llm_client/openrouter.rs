//! OpenRouter backend. Speaks the Chat Completions format on its own base URL
//! and passes the configured model through unchanged.

use async_trait::async_trait;

use super::chat_completions::ChatCompletionsClient;
use super::{require_api_key, LlmError, ModelBackend};
use crate::config::BackendConfig;
use crate::models::conversation::AssembledPrompt;

const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

pub struct OpenRouterBackend {
    inner: ChatCompletionsClient,
}

impl OpenRouterBackend {
    pub fn configure(cfg: &BackendConfig) -> Result<Self, LlmError> {
        let api_key = require_api_key(cfg, "OpenRouter")?.to_string();
        Ok(Self {
            inner: ChatCompletionsClient::new(OPENROUTER_API_BASE, api_key, cfg.model.clone(), cfg)?,
        })
    }
}

#[async_trait]
impl ModelBackend for OpenRouterBackend {
    fn name(&self) -> &'static str {
        "OpenRouter"
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn send(&self, prompt: &AssembledPrompt) -> Result<String, LlmError> {
        self.inner.complete(prompt).await
    }
}
