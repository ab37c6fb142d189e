use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::AgentError;
use crate::traits::{ChatMessage, ChatRequest, Provider};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent<'a>>,
    contents: Vec<GeminiContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
}

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
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

    /// System messages become `systemInstruction`; the rest map onto the
    /// user/model turn roles.
    fn convert_messages<'a>(
        &self,
        messages: &'a [ChatMessage],
    ) -> (Option<GeminiContent<'a>>, Vec<GeminiContent<'a>>) {
        let mut system_instruction = None;
        let mut contents = Vec::with_capacity(messages.len());

        for message in messages {
            if message.role == "system" {
                system_instruction = Some(GeminiContent {
                    role: None,
                    parts: vec![GeminiPart {
                        text: &message.content,
                    }],
                });
                continue;
            }
            let role = if message.role == "assistant" {
                "model"
            } else {
                "user"
            };
            contents.push(GeminiContent {
                role: Some(role),
                parts: vec![GeminiPart {
                    text: &message.content,
                }],
            });
        }

        (system_instruction, contents)
    }

    async fn request_text(&self, request: ChatRequest<'_>) -> anyhow::Result<String> {
        let (system_instruction, contents) = self.convert_messages(request.messages);
        let gemini_request = GeminiRequest {
            system_instruction,
            contents,
            generation_config: request
                .temperature
                .map(|temperature| GenerationConfig { temperature }),
        };

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&gemini_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(AgentError::Provider { status, message }.into());
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .and_then(|p| p.text.clone())
            .ok_or_else(|| anyhow::anyhow!("empty response from Gemini"))?;

        Ok(text)
    }
}

#[async_trait]
impl Provider for GeminiProvider {
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
