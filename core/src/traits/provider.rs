use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub messages: &'a [ChatMessage],
    pub temperature: Option<f64>,
}

impl<'a> ChatRequest<'a> {
    pub fn new(messages: &'a [ChatMessage]) -> Self {
        Self {
            messages,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Text-completion capability. The transport may stream internally; only the
/// final text is surfaced.
///
/// Implementations must observe `cancel` and resolve into
/// `AgentError::Cancelled` instead of finishing the request.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn complete(
        &self,
        request: ChatRequest<'_>,
        cancel: &CancellationToken,
    ) -> anyhow::Result<String>;
}

/// Image-generation capability. Returns the image as base64-encoded bytes.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate(&self, prompt: &str, cancel: &CancellationToken) -> anyhow::Result<String>;
}
