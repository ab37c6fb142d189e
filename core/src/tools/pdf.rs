use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::memory::MemoryEntry;
use crate::traits::{ExecuteOptions, Tool, ToolArgs, ToolId, ToolOutput};

use super::extract_user_question;

const CONTENT_CHARS: usize = 2000;

static PDF_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[PDF:\s*([^\]]+)\]").expect("valid pdf marker regex"));

/// Reads a PDF named by the `[PDF: path]` marker and summarizes page count
/// plus leading content. All failures (missing marker, missing file, parse
/// errors) are conversation content.
pub struct PdfTool {
    workspace_dir: PathBuf,
}

impl PdfTool {
    pub fn new(workspace_dir: impl Into<PathBuf>) -> Self {
        Self {
            workspace_dir: workspace_dir.into(),
        }
    }

    fn resolve(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_dir.join(path)
        }
    }
}

/// The path from the last `[PDF: ...]` marker, and the question text with
/// every marker removed.
fn parse_pdf_request(question: &str) -> (Option<String>, String) {
    let path = PDF_MARKER
        .captures_iter(question)
        .last()
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string());
    let remainder = PDF_MARKER.replace_all(question, "").trim().to_string();
    (path, remainder)
}

fn read_summary(path: &Path) -> anyhow::Result<(usize, String)> {
    let document = lopdf::Document::load(path)?;
    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    let text = document.extract_text(&pages)?;
    Ok((pages.len(), text))
}

#[async_trait]
impl Tool for PdfTool {
    fn id(&self) -> ToolId {
        ToolId::Pdf
    }

    fn description(&self) -> &str {
        "قراءة أو تلخيص ملف PDF"
    }

    async fn execute(&self, args: ToolArgs, opts: &ExecuteOptions) -> anyhow::Result<ToolOutput> {
        let question = extract_user_question(&args.input);
        let (path, user_question) = parse_pdf_request(question);

        let Some(path) = path else {
            let output = "من فضلك ارفق ملف PDF بصيغة [PDF: المسار] عشان اقدر اقرأه.";
            opts.memory.add(MemoryEntry::tagged("pdf", output));
            return Ok(ToolOutput::text(output));
        };

        let resolved = self.resolve(&path);
        if !resolved.exists() {
            let output = format!("ملف PDF غير موجود: {path}");
            opts.memory.add(MemoryEntry::tagged("pdf", &output));
            return Ok(ToolOutput::text(output));
        }

        let (page_count, text) = match read_summary(&resolved) {
            Ok(summary) => summary,
            Err(err) => {
                tracing::warn!(path = %resolved.display(), error = %err, "pdf read failed");
                let output = format!("خطأ في قراءة PDF: {err}");
                opts.memory.add(MemoryEntry::tagged("pdf", &output));
                return Ok(ToolOutput::text(output));
            }
        };

        let content: String = text.chars().take(CONTENT_CHARS).collect();
        let mut output = format!("عدد الصفحات: {page_count}\n\nالمحتوى:\n{content}");
        if !user_question.is_empty() {
            output.push_str(&format!("\n\nسؤال المستخدم: {user_question}"));
        }

        opts.memory.add(MemoryEntry::tagged("pdf", &output));
        Ok(ToolOutput::text(output))
    }
}
