use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AgentError;
use crate::memory::MemoryEntry;
use crate::traits::{ExecuteOptions, Tool, ToolArgs, ToolId, ToolOutput};

use super::extract_user_question;

const SEARCH_ERROR_MESSAGE: &str = "حدث خطأ أثناء البحث، حاول مرة أخرى.";
const NO_RESULTS_MESSAGE: &str = "لم أجد نتائج لهذا البحث.";
const UNTITLED: &str = "بدون عنوان";
const SNIPPET_CHARS: usize = 300;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaRequest<'a> {
    query: &'a str,
    num_results: u32,
    contents: ExaContents,
}

#[derive(Debug, Serialize)]
struct ExaContents {
    text: bool,
}

#[derive(Debug, Deserialize)]
struct ExaResponse {
    results: Vec<ExaResult>,
}

#[derive(Debug, Deserialize)]
struct ExaResult {
    title: Option<String>,
    url: String,
    text: Option<String>,
}

/// Web search over the Exa REST API. Transport failures and empty result
/// sets are conversation content, not errors.
pub struct SearchTool {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SearchTool {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            base_url: "https://api.exa.ai".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn request_results(&self, query: &str) -> anyhow::Result<Vec<ExaResult>> {
        let request = ExaRequest {
            query,
            num_results: 5,
            contents: ExaContents { text: true },
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(AgentError::Provider { status, message }.into());
        }

        let exa_response: ExaResponse = response.json().await?;
        Ok(exa_response.results)
    }
}

fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_CHARS).collect()
}

fn render_results(results: &[ExaResult]) -> (String, serde_json::Value) {
    let mut lines = Vec::with_capacity(results.len());
    let mut structured = Vec::with_capacity(results.len());

    for (i, result) in results.iter().enumerate() {
        let title = result.title.as_deref().unwrap_or(UNTITLED);
        let text = result.text.as_deref().map(snippet).unwrap_or_default();
        lines.push(format!("{}. {}\n{}\n{}", i + 1, title, result.url, text));
        structured.push(json!({
            "title": title,
            "url": result.url,
            "text": text,
        }));
    }

    (lines.join("\n\n"), json!({ "results": structured }))
}

/// (memory record, user-facing output) for a completed search.
fn respond(results: Vec<ExaResult>) -> (String, ToolOutput) {
    if results.is_empty() {
        return (
            NO_RESULTS_MESSAGE.to_string(),
            ToolOutput::text(NO_RESULTS_MESSAGE),
        );
    }
    let (rendered, structured) = render_results(&results);
    let record =
        serde_json::to_string_pretty(&structured).unwrap_or_else(|_| structured.to_string());
    (record, ToolOutput::text(rendered))
}

#[async_trait]
impl Tool for SearchTool {
    fn id(&self) -> ToolId {
        ToolId::Search
    }

    fn description(&self) -> &str {
        "بحث في الإنترنت باستخدام Exa API"
    }

    async fn execute(&self, args: ToolArgs, opts: &ExecuteOptions) -> anyhow::Result<ToolOutput> {
        let query = extract_user_question(&args.input);

        let fetch = self.request_results(query);
        let results = tokio::select! {
            biased;
            _ = opts.cancel.cancelled() => return Err(AgentError::Cancelled.into()),
            results = fetch => results,
        };

        let results = match results {
            Ok(results) => results,
            Err(err) => {
                tracing::warn!(error = %err, "search request failed");
                opts.memory
                    .add(MemoryEntry::tagged("search", SEARCH_ERROR_MESSAGE));
                return Ok(ToolOutput::text(SEARCH_ERROR_MESSAGE));
            }
        };

        let (record, output) = respond(results);
        opts.memory.add(MemoryEntry::tagged("search", record));
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_respects_char_boundaries() {
        let arabic = "م".repeat(400);
        assert_eq!(snippet(&arabic).chars().count(), SNIPPET_CHARS);
        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn render_numbers_results_and_fills_missing_title() {
        let results = vec![
            ExaResult {
                title: Some("Rust 1.80".to_string()),
                url: "https://example.com/a".to_string(),
                text: Some("release notes".to_string()),
            },
            ExaResult {
                title: None,
                url: "https://example.com/b".to_string(),
                text: None,
            },
        ];

        let (rendered, structured) = render_results(&results);
        assert!(rendered.starts_with("1. Rust 1.80"));
        assert!(rendered.contains("2. بدون عنوان"));
        assert_eq!(structured["results"][1]["title"], UNTITLED);
        assert_eq!(structured["results"][0]["text"], "release notes");
    }

    #[test]
    fn request_wire_shape() {
        let request = ExaRequest {
            query: "أخبار الذكاء الاصطناعي",
            num_results: 5,
            contents: ExaContents { text: true },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["numResults"], 5);
        assert_eq!(json["contents"]["text"], true);
    }

    #[test]
    fn empty_results_become_recoverable_text() {
        let (record, output) = respond(Vec::new());
        assert_eq!(record, NO_RESULTS_MESSAGE);
        assert_eq!(output.as_text(), Some(NO_RESULTS_MESSAGE));
    }
}
