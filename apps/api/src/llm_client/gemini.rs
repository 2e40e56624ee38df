//! Google Gemini backend (`generateContent` REST API).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{http_client, require_api_key, LlmError, ModelBackend};
use crate::config::BackendConfig;
use crate::models::conversation::{AssembledPrompt, ConversationTurn, Role};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const TOP_P: f32 = 0.95;

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

pub struct GeminiBackend {
    client: Client,
    api_key: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
    timeout: Duration,
}

impl GeminiBackend {
    pub fn configure(cfg: &BackendConfig) -> Result<Self, LlmError> {
        let api_key = require_api_key(cfg, "Gemini")?.to_string();
        Ok(Self {
            client: http_client(cfg.request_timeout)?,
            api_key,
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_output_tokens: cfg.max_output_tokens,
            timeout: cfg.request_timeout,
        })
    }

    fn build_request<'a>(&self, prompt: &'a AssembledPrompt) -> GenerateContentRequest<'a> {
        // Gemini takes the leading system text separately from the dialogue.
        // System turns further down (from caller history) stay in place as
        // user turns, and Gemini rejects empty text parts.
        let turns = prompt.turns();
        let lead = turns.iter().take_while(|t| t.role == Role::System).count();
        let has_text = |t: &&ConversationTurn| !t.content.trim().is_empty();

        let system_parts: Vec<Part<'a>> = turns[..lead]
            .iter()
            .filter(has_text)
            .map(|t| Part { text: &t.content })
            .collect();

        let contents = turns[lead..]
            .iter()
            .filter(has_text)
            .map(|t| Content {
                role: Some(match t.role {
                    Role::Assistant => "model",
                    Role::User | Role::System => "user",
                }),
                parts: vec![Part { text: &t.content }],
            })
            .collect();

        GenerateContentRequest {
            system_instruction: (!system_parts.is_empty()).then_some(Content {
                role: None,
                parts: system_parts,
            }),
            contents,
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
                top_p: TOP_P,
            },
        }
    }
}

#[async_trait]
impl ModelBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, prompt: &AssembledPrompt) -> Result<String, LlmError> {
        let url = format!("{GEMINI_API_BASE}/models/{}:generateContent", self.model);
        let body = self.build_request(prompt);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::from_status(status.as_u16(), message));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        let text = parsed.text().ok_or_else(|| {
            LlmError::MalformedResponse("Gemini returned no text candidates".to_string())
        })?;
        debug!("Gemini call succeeded: {} chars", text.len());
        Ok(text)
    }
}
