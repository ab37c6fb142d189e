use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::traits::{ChatMessage, ChatRequest, Provider, ToolId};

const SELECTOR_SYSTEM_PROMPT: &str = r#"أنت محدد أدوات. اختر الأداة المناسبة بناءً على الكلمات المفتاحية:

explain_code: إذا طلب المستخدم "شرح", "اشرح", "فهم", "وضح", "ايه دا", "بيعمل ايه", "explain", "كود", "code"
generate_code: إذا طلب "اكتب", "اعمل", "أنشئ", "create", "write", "build" كود جديد
search: إذا طلب "ابحث", "دور", "search", "أخبار", "معلومات عن"
pdf: إذا كانت الرسالة تحتوي على "[PDF:" أو طلب قراءة/تلخيص PDF
generate_image: إذا طلب "صورة", "ارسم", "image", "generate image", "عدل الصورة", "عدل على الصورة", "اكتب على الصورة", "اكتب عليها", "غير الصورة", "حط على الصورة", "ضيف على الصورة", "edit image", "modify image"
chat: فقط للتحيات (مرحبا, هلا, ازيك) والأسئلة العامة غير التقنية

مهم جداً:
- إذا كان فيه كود في الرسالة وطلب شرح → explain_code
- إذا المستخدم بيتكلم عن صورة سابقة أو عايز يعدل عليها → generate_image
- إذا المستخدم قال "عليها" أو "على الصورة" → generate_image
ارجع اسم الأداة فقط (كلمة واحدة)."#;

/// Classifier that maps a user message onto one [`ToolId`].
///
/// The decision runs on the raw user message only, without conversation
/// history. Any reply that does not name a known tool resolves to
/// [`ToolId::FALLBACK`].
pub struct ToolSelector {
    provider: Arc<dyn Provider>,
}

impl ToolSelector {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    pub async fn select(
        &self,
        user_message: &str,
        cancel: &CancellationToken,
    ) -> anyhow::Result<ToolId> {
        let messages = [
            ChatMessage::system(SELECTOR_SYSTEM_PROMPT),
            ChatMessage::user(user_message),
        ];
        let raw = self
            .provider
            .complete(ChatRequest::new(&messages), cancel)
            .await?;

        let cleaned = normalize_reply(&raw);
        let tool = ToolId::parse(&cleaned).unwrap_or(ToolId::FALLBACK);
        tracing::debug!(raw = raw.trim(), cleaned = %cleaned, tool = %tool, "tool selected");
        Ok(tool)
    }
}

/// Canonicalize a model reply into a candidate tool name: lowercase, runs of
/// whitespace and hyphens become a single `_`, everything outside `[a-z_]`
/// is dropped.
fn normalize_reply(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_separator = false;
    for ch in raw.trim().to_lowercase().chars() {
        if ch.is_whitespace() || ch == '-' {
            pending_separator = !out.is_empty();
            continue;
        }
        if ch.is_ascii_lowercase() || ch == '_' {
            if pending_separator {
                out.push('_');
                pending_separator = false;
            }
            out.push(ch);
        }
    }
    out
}
