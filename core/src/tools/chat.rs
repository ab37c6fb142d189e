use std::sync::Arc;

use async_trait::async_trait;

use crate::traits::{
    ChatMessage, ChatRequest, ExecuteOptions, Provider, Tool, ToolArgs, ToolId, ToolOutput,
};

const CHAT_SYSTEM_PROMPT: &str =
    "أنت مساعد ذكي ودود. رد على المستخدم بطريقة طبيعية ومفيدة. استخدم اللغة العربية.";

/// Plain conversation, and the registry's unconditional fallback. The full
/// input blob (history included) goes to the model so follow-up questions
/// can lean on earlier turns.
pub struct ChatTool {
    provider: Arc<dyn Provider>,
}

impl ChatTool {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for ChatTool {
    fn id(&self) -> ToolId {
        ToolId::Chat
    }

    fn description(&self) -> &str {
        "للمحادثات العادية والتحيات والأسئلة العامة"
    }

    async fn execute(&self, args: ToolArgs, opts: &ExecuteOptions) -> anyhow::Result<ToolOutput> {
        let messages = [
            ChatMessage::system(CHAT_SYSTEM_PROMPT),
            ChatMessage::user(&args.input),
        ];
        let reply = self
            .provider
            .complete(ChatRequest::new(&messages), &opts.cancel)
            .await?;
        Ok(ToolOutput::text(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    use crate::memory::SessionMemory;
    use crate::providers::MockProvider;

    #[tokio::test]
    async fn sends_full_input_to_provider() {
        let provider = Arc::new(MockProvider::with_replies(["أهلا بيك"]));
        let tool = ChatTool::new(provider.clone());
        let opts = ExecuteOptions {
            cancel: CancellationToken::new(),
            memory: Arc::new(SessionMemory::new()),
        };

        let output = tool
            .execute(
                ToolArgs {
                    input: "[user]\nمرحبا\n\nسؤال المستخدم:\nمرحبا".to_string(),
                },
                &opts,
            )
            .await
            .unwrap();

        assert_eq!(output, ToolOutput::text("أهلا بيك"));
        let requests = provider.requests();
        assert!(requests[0][1].content.contains("[user]"));
        assert!(opts.memory.is_empty());
    }
}
