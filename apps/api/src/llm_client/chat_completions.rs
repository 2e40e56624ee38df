//! Wire format shared by providers that speak the OpenAI Chat Completions API.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{http_client, LlmError};
use crate::config::BackendConfig;
use crate::models::conversation::AssembledPrompt;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatCompletionMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatCompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// A Chat Completions endpoint bound to one base URL, key and model.
pub(crate) struct ChatCompletionsClient {
    client: Client,
    base_url: &'static str,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl ChatCompletionsClient {
    pub(crate) fn new(
        base_url: &'static str,
        api_key: String,
        model: String,
        cfg: &BackendConfig,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: http_client(cfg.request_timeout)?,
            base_url,
            api_key,
            model,
            temperature: cfg.temperature,
            max_tokens: cfg.max_output_tokens,
            timeout: cfg.request_timeout,
        })
    }

    pub(crate) fn model(&self) -> &str {
        &self.model
    }

    fn build_request<'a>(&'a self, prompt: &'a AssembledPrompt) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: prompt
                .turns()
                .iter()
                .map(|t| ChatCompletionMessage {
                    role: t.role.as_str(),
                    content: &t.content,
                })
                .collect(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    pub(crate) async fn complete(&self, prompt: &AssembledPrompt) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request(prompt);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::from_status(status.as_u16(), message));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "Chat completion succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::MalformedResponse("response contained no message content".into()))
    }
}
