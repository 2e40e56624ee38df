use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_VECTOR_DB_URL: &str = "http://localhost:8001";
const DEFAULT_CHROMA_TENANT: &str = "default_tenant";
const DEFAULT_CHROMA_DATABASE: &str = "default_database";

/// Hosted language-model provider selected for the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Gemini,
    OpenAi,
    OpenRouter,
}

impl BackendKind {
    /// Resolves the `AI_SERVICE` value. Unrecognised values fall back to Gemini.
    pub fn from_setting(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => BackendKind::OpenAi,
            "openrouter" => BackendKind::OpenRouter,
            _ => BackendKind::Gemini,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Gemini => "gemini",
            BackendKind::OpenAi => "openai",
            BackendKind::OpenRouter => "openrouter",
        }
    }
}

/// Provider that computes document and query embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingKind {
    Gemini,
    OpenAi,
}

impl EmbeddingKind {
    /// Resolves `EMBEDDING_SERVICE`. Unrecognised values fall back to Gemini.
    pub fn from_setting(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => EmbeddingKind::OpenAi,
            _ => EmbeddingKind::Gemini,
        }
    }

    /// OpenRouter has no embeddings API, so only an OpenAI chat backend
    /// implies OpenAI embeddings.
    fn default_for(backend: BackendKind) -> Self {
        match backend {
            BackendKind::OpenAi => EmbeddingKind::OpenAi,
            BackendKind::Gemini | BackendKind::OpenRouter => EmbeddingKind::Gemini,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingKind::Gemini => "gemini",
            EmbeddingKind::OpenAi => "openai",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            EmbeddingKind::Gemini => "gemini-embedding-001",
            EmbeddingKind::OpenAi => "text-embedding-3-small",
        }
    }
}

#[derive(Clone)]
pub struct EmbeddingConfig {
    pub kind: EmbeddingKind,
    pub api_key: Option<String>,
    pub model: String,
}

/// Generation settings handed to the selected backend when it is first built.
#[derive(Clone)]
pub struct BackendConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub request_timeout: Duration,
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Application configuration loaded from environment variables.
/// Read once at startup and shared read-only through `AppState`.
#[derive(Clone)]
pub struct Config {
    pub ai_service: BackendKind,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub ai_model: String,
    pub ai_temperature: f32,
    pub ai_max_tokens: u32,
    pub ai_request_timeout_secs: u64,
    pub embedding_service: EmbeddingKind,
    pub embedding_model: String,
    pub vector_db_url: String,
    pub chroma_tenant: String,
    pub chroma_database: String,
    pub vector_collection: String,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let ai_service = BackendKind::from_setting(&env_or("AI_SERVICE", "gemini"));
        let embedding_service = optional_env("EMBEDDING_SERVICE")
            .map(|v| EmbeddingKind::from_setting(&v))
            .unwrap_or_else(|| EmbeddingKind::default_for(ai_service));

        Ok(Config {
            ai_service,
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openrouter_api_key: optional_env("OPENROUTER_API_KEY"),
            ai_model: env_or("AI_MODEL", DEFAULT_MODEL),
            ai_temperature: check_temperature(parse_env("AI_TEMPERATURE", 0.7)?)?,
            ai_max_tokens: check_positive("AI_MAX_TOKENS", parse_env("AI_MAX_TOKENS", 500)?)?,
            ai_request_timeout_secs: check_positive(
                "AI_REQUEST_TIMEOUT_SECS",
                parse_env("AI_REQUEST_TIMEOUT_SECS", 30)?,
            )?,
            embedding_service,
            embedding_model: optional_env("EMBEDDING_MODEL")
                .unwrap_or_else(|| embedding_service.default_model().to_string()),
            vector_db_url: env_or("VECTOR_DB_URL", DEFAULT_VECTOR_DB_URL),
            chroma_tenant: env_or("CHROMA_TENANT", DEFAULT_CHROMA_TENANT),
            chroma_database: env_or("CHROMA_DATABASE", DEFAULT_CHROMA_DATABASE),
            vector_collection: env_or("VECTOR_COLLECTION", "jobs"),
            host: env_or("HOST", "0.0.0.0"),
            port: parse_env("PORT", 8000)?,
            allowed_origins: split_origins(&env_or("ALLOWED_ORIGINS", "http://localhost:4200")),
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// Credential for the selected backend, if one was provided.
    pub fn active_api_key(&self) -> Option<&str> {
        match self.ai_service {
            BackendKind::Gemini => self.gemini_api_key.as_deref(),
            BackendKind::OpenAi => self.openai_api_key.as_deref(),
            BackendKind::OpenRouter => self.openrouter_api_key.as_deref(),
        }
    }

    pub fn embedding_config(&self) -> EmbeddingConfig {
        let api_key = match self.embedding_service {
            EmbeddingKind::Gemini => self.gemini_api_key.clone(),
            EmbeddingKind::OpenAi => self.openai_api_key.clone(),
        };
        EmbeddingConfig {
            kind: self.embedding_service,
            api_key,
            model: self.embedding_model.clone(),
        }
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            api_key: self.active_api_key().map(str::to_string),
            model: self.ai_model.clone(),
            temperature: self.ai_temperature,
            max_output_tokens: self.ai_max_tokens,
            request_timeout: Duration::from_secs(self.ai_request_timeout_secs),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Unset and blank values are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

fn check_positive<T>(key: &str, value: T) -> Result<T>
where
    T: PartialOrd + Default + fmt::Display,
{
    if value <= T::default() {
        bail!("Environment variable '{key}' must be greater than zero, got {value}");
    }
    Ok(value)
}

fn check_temperature(value: f32) -> Result<f32> {
    if !value.is_finite() || value < 0.0 {
        bail!("Environment variable 'AI_TEMPERATURE' must be a non-negative number, got {value}");
    }
    Ok(value)
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
