//! OpenAI-compatible completion backend.
//!
//! Speaks the chat-completions API of OpenAI and compatible servers. The
//! context and user prompt are combined into a single user message; any
//! transport or API failure surfaces as `ExternalService`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use quill_core::{CompletionBackend, Error, Result};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default completion model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default request timeout (seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Sampling temperature used for note-context completions.
const TEMPERATURE: f32 = 0.7;

/// Response token cap.
const MAX_TOKENS: u32 = 500;

/// Configuration for the OpenAI backend.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl OpenAiConfig {
    /// Build a config from `QUILL_OPENAI_URL`, `QUILL_OPENAI_KEY`,
    /// `QUILL_OPENAI_MODEL`, and `QUILL_GEN_TIMEOUT_SECS`, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("QUILL_OPENAI_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("QUILL_OPENAI_KEY").ok(),
            model: std::env::var("QUILL_OPENAI_MODEL").unwrap_or(defaults.model),
            timeout_secs: std::env::var("QUILL_GEN_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }
}

/// OpenAI-compatible chat-completions backend.
pub struct OpenAiBackend {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiBackend {
    /// Create a backend with the given configuration.
    pub fn new(config: OpenAiConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        info!(model = %config.model, base_url = %config.base_url, "initializing OpenAI backend");
        Self { client, config }
    }

    /// Create a backend configured from the environment.
    pub fn from_env() -> Self {
        Self::new(OpenAiConfig::from_env())
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, system: &str, context: &str, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Context: {context}\n\nQuestion: {prompt}"),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        debug!(prompt_len = prompt.len(), context_len = context.len(), "sending completion request");

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ExternalService(format!(
                "completion request failed with {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::ExternalService(format!("malformed completion response: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::ExternalService("completion response had no choices".to_string()))
    }
}
