use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::AgentError;
use crate::traits::{ChatMessage, ChatRequest, Provider};

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: String,
    messages: Vec<OpenAIMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn request_text(&self, request: ChatRequest<'_>) -> anyhow::Result<String> {
        let openai_request = OpenAIRequest {
            model: self.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| OpenAIMessage {
                    role: &m.role,
                    content: &m.content,
                })
                .collect(),
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&openai_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(AgentError::Provider { status, message }.into());
        }

        let openai_response: OpenAIResponse = response.json().await?;
        let text = openai_response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("empty response from API"))?;

        Ok(text)
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    async fn complete(
        &self,
        request: ChatRequest<'_>,
        cancel: &CancellationToken,
    ) -> anyhow::Result<String> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AgentError::Cancelled.into()),
            result = self.request_text(request) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_is_omitted_when_unset() {
        let messages = [ChatMessage::user("hi")];
        let request = OpenAIRequest {
            model: "gpt-4o".to_string(),
            messages: messages
                .iter()
                .map(|m| OpenAIMessage {
                    role: &m.role,
                    content: &m.content,
                })
                .collect(),
            temperature: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("temperature").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
