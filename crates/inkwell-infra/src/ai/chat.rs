//! Client for OpenAI-compatible `/chat/completions` endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use inkwell_core::ports::{AiError, CompletionClient, CompletionRequest};

/// Upstream API configuration.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
        }
    }
}

impl CompletionConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let api_key = std::env::var("AI_API_KEY").ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            tracing::warn!("AI_API_KEY is not set; AI endpoints will fail upstream");
        }

        Self {
            api_key,
            base_url: std::env::var("AI_BASE_URL").unwrap_or(defaults.base_url),
            model: std::env::var("AI_MODEL").unwrap_or(defaults.model),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Sends each prompt as a single user message and returns the first choice.
pub struct ChatCompletionClient {
    http: reqwest::Client,
    config: CompletionConfig,
}

impl ChatCompletionClient {
    pub fn new(config: CompletionConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("inkwell/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AiError::Upstream(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, AiError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
        };

        let mut call = self.http.post(self.config.endpoint()).json(&body);
        if let Some(key) = &self.config.api_key {
            call = call.bearer_auth(key);
        }

        let response = call
            .send()
            .await
            .map_err(|e| AiError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(%status, model = %self.config.model, "Completion request rejected");
            return Err(AiError::Upstream(format!("{status}: {detail}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::Upstream(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AiError::EmptyResponse)
    }
}
