use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::memory::MemoryEntry;
use crate::traits::{
    ChatMessage, ChatRequest, ExecuteOptions, ImageProvider, Provider, Tool, ToolArgs, ToolId,
    ToolOutput,
};

use super::extract_user_question;

const TRANSLATOR_SYSTEM_PROMPT: &str = "You are a translator. Translate the user's image description from Arabic to English.\nOutput ONLY the English translation, nothing else.\nMake it descriptive and detailed for image generation.";

const IMAGE_SUCCESS_NOTE: &str = "تم توليد الصورة بنجاح";

/// Two-step image generation: translate the Arabic description to English
/// with the text provider, then render one 1:1 image.
pub struct GenerateImageTool {
    provider: Arc<dyn Provider>,
    image_provider: Arc<dyn ImageProvider>,
}

impl GenerateImageTool {
    pub fn new(provider: Arc<dyn Provider>, image_provider: Arc<dyn ImageProvider>) -> Self {
        Self {
            provider,
            image_provider,
        }
    }

    async fn generate(&self, prompt: &str, opts: &ExecuteOptions) -> anyhow::Result<String> {
        let messages = [
            ChatMessage::system(TRANSLATOR_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];
        let english = self
            .provider
            .complete(ChatRequest::new(&messages), &opts.cancel)
            .await?;
        let english = english.trim();
        tracing::debug!(prompt = english, "image prompt translated");

        self.image_provider.generate(english, &opts.cancel).await
    }
}

#[async_trait]
impl Tool for GenerateImageTool {
    fn id(&self) -> ToolId {
        ToolId::GenerateImage
    }

    fn description(&self) -> &str {
        "توليد صورة عالية الجودة بناءً على وصف المستخدم"
    }

    async fn execute(&self, args: ToolArgs, opts: &ExecuteOptions) -> anyhow::Result<ToolOutput> {
        let prompt = extract_user_question(&args.input);

        match self.generate(prompt, opts).await {
            Ok(data) => {
                opts.memory
                    .add(MemoryEntry::tagged("generate_image", IMAGE_SUCCESS_NOTE));
                Ok(ToolOutput::image(data))
            }
            Err(err) if AgentError::is_cancellation(&err) => Err(err),
            Err(err) => {
                tracing::warn!(error = %err, "image generation failed");
                let output = format!("فشل توليد الصورة: {err}");
                opts.memory
                    .add(MemoryEntry::tagged("generate_image", &output));
                Ok(ToolOutput::text(output))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    use crate::memory::SessionMemory;
    use crate::providers::{MockImageProvider, MockProvider};

    fn opts() -> ExecuteOptions {
        ExecuteOptions {
            cancel: CancellationToken::new(),
            memory: Arc::new(SessionMemory::new()),
        }
    }

    #[tokio::test]
    async fn translates_then_returns_image_output() {
        let provider = Arc::new(MockProvider::with_replies(["a white cat on a chair"]));
        let tool = GenerateImageTool::new(provider.clone(), Arc::new(MockImageProvider::default()));
        let opts = opts();

        let output = tool
            .execute(
                ToolArgs {
                    input: "سؤال المستخدم:\nارسم قطة بيضاء على كرسي".to_string(),
                },
                &opts,
            )
            .await
            .unwrap();

        assert_eq!(output, ToolOutput::image("aGVsbG8="));

        let requests = provider.requests();
        assert_eq!(requests[0][1].content, "ارسم قطة بيضاء على كرسي");

        let memory = opts.memory.context();
        assert!(memory.contains("[generate_image]"));
        assert!(!memory.contains("aGVsbG8="));
    }

    #[tokio::test]
    async fn translation_failure_is_recoverable_text() {
        let provider = Arc::new(MockProvider::default());
        let tool = GenerateImageTool::new(provider, Arc::new(MockImageProvider::default()));
        let opts = opts();

        let output = tool
            .execute(
                ToolArgs {
                    input: "سؤال المستخدم:\nارسم قطة".to_string(),
                },
                &opts,
            )
            .await
            .unwrap();

        assert!(output.as_text().unwrap().contains("فشل توليد الصورة"));
    }

    #[tokio::test]
    async fn cancellation_propagates_as_error() {
        let provider = Arc::new(MockProvider::with_replies(["a cat"]));
        let tool = GenerateImageTool::new(provider, Arc::new(MockImageProvider::default()));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let opts = ExecuteOptions {
            cancel,
            memory: Arc::new(SessionMemory::new()),
        };

        let err = tool
            .execute(
                ToolArgs {
                    input: "سؤال المستخدم:\nارسم قطة".to_string(),
                },
                &opts,
            )
            .await
            .unwrap_err();

        assert!(AgentError::is_cancellation(&err));
    }
}
