use std::sync::Arc;

use async_trait::async_trait;

use crate::memory::MemoryEntry;
use crate::traits::{
    ChatMessage, ChatRequest, ExecuteOptions, Provider, Tool, ToolArgs, ToolId, ToolOutput,
};

const GENERATE_SYSTEM_PROMPT: &str = "أنت مساعد ذكي يكتب كود برمجي.";

/// Writes new code from the user's requirements. The full input blob goes to
/// the model so earlier turns (previous snippets, constraints) stay visible.
pub struct GenerateCodeTool {
    provider: Arc<dyn Provider>,
}

impl GenerateCodeTool {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for GenerateCodeTool {
    fn id(&self) -> ToolId {
        ToolId::GenerateCode
    }

    fn description(&self) -> &str {
        "توليد كود بناءً على متطلبات"
    }

    async fn execute(&self, args: ToolArgs, opts: &ExecuteOptions) -> anyhow::Result<ToolOutput> {
        let messages = [
            ChatMessage::system(GENERATE_SYSTEM_PROMPT),
            ChatMessage::user(&args.input),
        ];
        let code = self
            .provider
            .complete(ChatRequest::new(&messages), &opts.cancel)
            .await?;

        opts.memory.add(MemoryEntry::tagged("generate_code", &code));
        Ok(ToolOutput::text(code))
    }
}
