use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::memory::SessionMemory;

/// The closed set of capabilities the selector may choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    ExplainCode,
    GenerateCode,
    Search,
    Pdf,
    GenerateImage,
    Chat,
}

impl ToolId {
    pub const ALL: [ToolId; 6] = [
        ToolId::ExplainCode,
        ToolId::GenerateCode,
        ToolId::Search,
        ToolId::Pdf,
        ToolId::GenerateImage,
        ToolId::Chat,
    ];

    /// The unconditional fallback: plain chat.
    pub const FALLBACK: ToolId = ToolId::Chat;

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolId::ExplainCode => "explain_code",
            ToolId::GenerateCode => "generate_code",
            ToolId::Search => "search",
            ToolId::Pdf => "pdf",
            ToolId::GenerateImage => "generate_image",
            ToolId::Chat => "chat",
        }
    }

    /// Parse an already-normalized (lowercase, `_`-separated) name.
    pub fn parse(name: &str) -> Option<ToolId> {
        ToolId::ALL.iter().copied().find(|id| id.as_str() == name)
    }
}

impl std::fmt::Display for ToolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The uniform input contract: one context blob per invocation.
#[derive(Debug, Clone)]
pub struct ToolArgs {
    pub input: String,
}

/// Per-invocation collaborators threaded from the executor.
#[derive(Clone)]
pub struct ExecuteOptions {
    pub cancel: CancellationToken,
    pub memory: Arc<SessionMemory>,
}

/// A tool answer: plain text, or a tagged structured payload.
///
/// Recoverable failures (missing file, empty search results, rejected
/// generation) are returned as ordinary `Text` by convention, never as `Err`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolOutput {
    Text { content: String },
    Image { data: String, format: String },
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        ToolOutput::Text {
            content: content.into(),
        }
    }

    pub fn image(data: impl Into<String>) -> Self {
        ToolOutput::Image {
            data: data.into(),
            format: "base64".into(),
        }
    }

    /// Transcript rendering: image payloads become a short note, never the
    /// encoded bytes.
    pub fn memory_note(&self) -> String {
        match self {
            ToolOutput::Text { content } => content.clone(),
            ToolOutput::Image { data, .. } => {
                format!("image generated ({} base64 chars)", data.len())
            }
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ToolOutput::Text { content } => Some(content),
            ToolOutput::Image { .. } => None,
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn id(&self) -> ToolId;

    fn description(&self) -> &str;

    async fn execute(&self, args: ToolArgs, opts: &ExecuteOptions) -> anyhow::Result<ToolOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_id_round_trip() {
        for id in ToolId::ALL {
            assert_eq!(ToolId::parse(id.as_str()), Some(id));
        }
        assert_eq!(ToolId::parse("weather"), None);
    }

    #[test]
    fn image_output_wire_shape() {
        let out = ToolOutput::image("aGVsbG8=");
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["kind"], "image");
        assert_eq!(json["data"], "aGVsbG8=");
        assert_eq!(json["format"], "base64");
    }

    #[test]
    fn image_memory_note_omits_payload() {
        let out = ToolOutput::image("aGVsbG8=");
        let note = out.memory_note();
        assert!(!note.contains("aGVsbG8="));
        assert!(note.contains("image"));
    }
}
