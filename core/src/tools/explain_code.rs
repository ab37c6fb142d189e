use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;

use crate::memory::MemoryEntry;
use crate::traits::{
    ChatMessage, ChatRequest, ExecuteOptions, Provider, Tool, ToolArgs, ToolId, ToolOutput,
};

use super::extract_user_question;

const EXPLAIN_SYSTEM_PROMPT: &str = "أنت مساعد متخصص في شرح الأكواد خطوة بخطوة بالعربية. تجاهل أي سجل محادثة/ذاكرة أو رموز مثل [user]/[assistant] وركّز فقط على الكود. ابدأ بملخص سريع، ثم اشرح كل جزء، ثم اذكر أي أخطاء/تحسينات محتملة.";

const NO_CODE_MESSAGE: &str = "من فضلك ابعت الكود اللي عايز شرحه (يفضل داخل ``` ... ```)، وقلّي عايز شرح اي جزء بالظبط.";

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```[a-zA-Z0-9_+-]*\r?\n((?s).*?)```").expect("valid fence regex")
});

static CODE_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(import|export|function|class|const|let|var|return|if|else|def|print|fn|impl|SELECT|INSERT|UPDATE|DELETE)\b")
        .expect("valid keyword regex")
});

static CODE_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[{};<>:=]|=>").expect("valid punctuation regex"));

fn extract_fenced_blocks(text: &str) -> Vec<&str> {
    FENCED_BLOCK
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|code| !code.is_empty())
        .collect()
}

/// Heuristic only; false positives are cheap, the model sorts them out.
fn looks_like_code(text: &str) -> bool {
    text.contains("```") || CODE_KEYWORDS.is_match(text) || CODE_PUNCTUATION.is_match(text)
}

/// Step-by-step code explanation. Skips the model call entirely when the
/// message carries no code at all.
pub struct ExplainCodeTool {
    provider: Arc<dyn Provider>,
}

impl ExplainCodeTool {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    fn build_prompt(user_message: &str) -> String {
        let blocks = extract_fenced_blocks(user_message);
        if blocks.is_empty() {
            return format!("النص المرسل من المستخدم (قد يحتوي على كود):\n{user_message}");
        }

        let mut prompt = String::from("الكود المراد شرحه:\n\n");
        for (i, code) in blocks.iter().enumerate() {
            prompt.push_str(&format!("# جزء {}\n\n```\n{}\n```\n\n", i + 1, code));
        }
        prompt.push_str(&format!(
            "ملاحظة: لو فيه سؤال إضافي غير الكود موجود في الرسالة، خده في الاعتبار:\n{user_message}"
        ));
        prompt
    }
}

#[async_trait]
impl Tool for ExplainCodeTool {
    fn id(&self) -> ToolId {
        ToolId::ExplainCode
    }

    fn description(&self) -> &str {
        "شرح كود برمجي خطوة خطوة"
    }

    async fn execute(&self, args: ToolArgs, opts: &ExecuteOptions) -> anyhow::Result<ToolOutput> {
        let user_message = extract_user_question(&args.input);

        if !looks_like_code(user_message) {
            opts.memory
                .add(MemoryEntry::tagged("explain_code", NO_CODE_MESSAGE));
            return Ok(ToolOutput::text(NO_CODE_MESSAGE));
        }

        let prompt = Self::build_prompt(user_message);
        let messages = [
            ChatMessage::system(EXPLAIN_SYSTEM_PROMPT),
            ChatMessage::user(&prompt),
        ];
        let explanation = self
            .provider
            .complete(
                ChatRequest::new(&messages).with_temperature(0.2),
                &opts.cancel,
            )
            .await?;

        opts.memory
            .add(MemoryEntry::tagged("explain_code", &explanation));
        Ok(ToolOutput::text(explanation))
    }
}
