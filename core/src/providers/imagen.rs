use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::AgentError;
use crate::traits::ImageProvider;

#[derive(Debug, Serialize)]
struct ImagenRequest<'a> {
    instances: Vec<ImagenInstance<'a>>,
    parameters: ImagenParameters<'a>,
}

#[derive(Debug, Serialize)]
struct ImagenInstance<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagenParameters<'a> {
    sample_count: u32,
    aspect_ratio: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImagenResponse {
    predictions: Vec<ImagenPrediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImagenPrediction {
    bytes_base64_encoded: Option<String>,
}

pub struct ImagenProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl ImagenProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(180))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            model: "imagen-4.0-generate-001".to_string(),
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

    async fn request_image(&self, prompt: &str) -> anyhow::Result<String> {
        let imagen_request = ImagenRequest {
            instances: vec![ImagenInstance { prompt }],
            parameters: ImagenParameters {
                sample_count: 1,
                aspect_ratio: "1:1",
            },
        };

        let response = self
            .client
            .post(format!("{}/models/{}:predict", self.base_url, self.model))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&imagen_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(AgentError::Provider { status, message }.into());
        }

        let imagen_response: ImagenResponse = response.json().await?;
        let data = imagen_response
            .predictions
            .into_iter()
            .next()
            .and_then(|p| p.bytes_base64_encoded)
            .ok_or_else(|| anyhow::anyhow!("no image in response"))?;

        Ok(data)
    }
}

#[async_trait]
impl ImageProvider for ImagenProvider {
    async fn generate(&self, prompt: &str, cancel: &CancellationToken) -> anyhow::Result<String> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AgentError::Cancelled.into()),
            result = self.request_image(prompt) => result,
        }
    }
}
