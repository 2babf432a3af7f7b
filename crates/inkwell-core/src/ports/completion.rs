//! Text-completion port used by the AI assistant.

use async_trait::async_trait;

/// A single-prompt completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
        }
    }
}

/// Upstream language-model API. One call, no retries.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Return the text of the first completion choice.
    async fn complete(&self, request: CompletionRequest) -> Result<String, AiError>;
}

/// AI assistant errors.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Upstream returned no completion")]
    EmptyResponse,

    #[error("Malformed {operation} response: {detail}")]
    MalformedResponse {
        operation: &'static str,
        detail: String,
    },
}
