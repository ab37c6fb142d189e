use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::AgentError;
use crate::memory::{MemoryEntry, SessionMemory};
use crate::tools::USER_QUESTION_MARKER;
use crate::traits::{ExecuteOptions, Provider, ToolArgs, ToolId, ToolOutput};

use super::registry::ToolRegistry;
use super::selector::ToolSelector;

pub const CANCELLATION_NOTICE: &str = "تم إيقاف الطلب بواسطة المستخدم";

/// The result of one dispatch round.
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub tool: ToolId,
    pub output: ToolOutput,
    pub memory_snapshot: String,
}

/// Orchestrates one user turn: record, classify, dispatch, record again.
///
/// Cancellation is never an error at this level; a cancelled turn resolves
/// into a normal [`AgentRun`] carrying the cancellation notice.
pub struct AgentExecutor {
    selector: ToolSelector,
    registry: ToolRegistry,
    memory: Arc<SessionMemory>,
}

impl AgentExecutor {
    pub fn new(provider: Arc<dyn Provider>, registry: ToolRegistry) -> Self {
        Self {
            selector: ToolSelector::new(provider),
            registry,
            memory: Arc::new(SessionMemory::new()),
        }
    }

    pub fn with_memory(mut self, memory: Arc<SessionMemory>) -> Self {
        self.memory = memory;
        self
    }

    pub fn memory(&self) -> &Arc<SessionMemory> {
        &self.memory
    }

    pub async fn run(
        &self,
        user_message: &str,
        cancel: &CancellationToken,
    ) -> anyhow::Result<AgentRun> {
        self.memory.add(MemoryEntry::tagged("user", user_message));
        let context = self.memory.context();

        let tool_id = match self.selector.select(user_message, cancel).await {
            Ok(tool_id) => tool_id,
            Err(err) if AgentError::is_cancellation(&err) => {
                return Ok(self.cancelled_run(ToolId::FALLBACK));
            }
            Err(err) => {
                self.memory.add(MemoryEntry::tagged("error", err.to_string()));
                return Err(err);
            }
        };

        self.memory
            .add(MemoryEntry::tagged("tool_selected", tool_id.as_str()));
        tracing::info!(tool = %tool_id, "dispatching");

        let tool = self.registry.resolve(tool_id);
        let args = ToolArgs {
            input: format!("{context}\n\n{USER_QUESTION_MARKER}\n{user_message}"),
        };
        let opts = ExecuteOptions {
            cancel: cancel.clone(),
            memory: Arc::clone(&self.memory),
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(self.cancelled_run(tool_id)),
            result = tool.execute(args, &opts) => result,
        };

        match result {
            Ok(output) => {
                if cancel.is_cancelled() {
                    return Ok(self.cancelled_run(tool_id));
                }
                self.memory
                    .add(MemoryEntry::tagged("tool_output", output.memory_note()));
                Ok(AgentRun {
                    tool: tool_id,
                    output,
                    memory_snapshot: self.memory.context(),
                })
            }
            Err(err) if AgentError::is_cancellation(&err) || cancel.is_cancelled() => {
                Ok(self.cancelled_run(tool_id))
            }
            Err(err) => {
                self.memory.add(MemoryEntry::tagged("error", err.to_string()));
                Err(err)
            }
        }
    }

    fn cancelled_run(&self, tool: ToolId) -> AgentRun {
        self.memory
            .add(MemoryEntry::tagged("cancelled", CANCELLATION_NOTICE));
        AgentRun {
            tool,
            output: ToolOutput::text(CANCELLATION_NOTICE),
            memory_snapshot: self.memory.context(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::providers::MockProvider;
    use crate::traits::Tool;

    struct EchoTool(ToolId);

    #[async_trait]
    impl Tool for EchoTool {
        fn id(&self) -> ToolId {
            self.0
        }

        fn description(&self) -> &str {
            "echo"
        }

        async fn execute(
            &self,
            args: ToolArgs,
            _opts: &ExecuteOptions,
        ) -> anyhow::Result<ToolOutput> {
            Ok(ToolOutput::text(format!("echo: {}", args.input)))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn id(&self) -> ToolId {
            ToolId::Search
        }

        fn description(&self) -> &str {
            "failing"
        }

        async fn execute(
            &self,
            _args: ToolArgs,
            _opts: &ExecuteOptions,
        ) -> anyhow::Result<ToolOutput> {
            Err(anyhow::anyhow!("boom"))
        }
    }

    fn executor_with(replies: &[&str], tools: Vec<Arc<dyn Tool>>) -> AgentExecutor {
        let provider = Arc::new(MockProvider::with_replies(replies.iter().copied()));
        let registry = ToolRegistry::new(tools).unwrap();
        AgentExecutor::new(provider, registry)
    }

    #[tokio::test]
    async fn dispatches_to_selected_tool() {
        let executor = executor_with(
            &["search"],
            vec![
                Arc::new(EchoTool(ToolId::Chat)),
                Arc::new(EchoTool(ToolId::Search)),
            ],
        );
        let cancel = CancellationToken::new();

        let run = executor.run("ابحث عن أخبار الذكاء الاصطناعي", &cancel).await.unwrap();
        assert_eq!(run.tool, ToolId::Search);
    }

    #[tokio::test]
    async fn tool_input_carries_context_and_marker() {
        let executor = executor_with(&["chat"], vec![Arc::new(EchoTool(ToolId::Chat))]);
        let cancel = CancellationToken::new();

        let run = executor.run("مرحبا", &cancel).await.unwrap();
        let text = run.output.as_text().unwrap();
        assert!(text.contains("[user]\nمرحبا"));
        assert!(text.contains(&format!("{USER_QUESTION_MARKER}\nمرحبا")));
    }

    #[tokio::test]
    async fn memory_records_the_full_trace() {
        let executor = executor_with(&["chat"], vec![Arc::new(EchoTool(ToolId::Chat))]);
        let cancel = CancellationToken::new();

        let run = executor.run("مرحبا", &cancel).await.unwrap();
        let user_at = run.memory_snapshot.find("[user]").unwrap();
        let selected_at = run.memory_snapshot.find("[tool_selected]").unwrap();
        let output_at = run.memory_snapshot.find("[tool_output]").unwrap();
        assert!(user_at < selected_at && selected_at < output_at);
        assert!(run.memory_snapshot.contains("[tool_selected]\nchat"));
    }

    #[tokio::test]
    async fn unregistered_selection_resolves_to_fallback() {
        let executor = executor_with(&["pdf"], vec![Arc::new(EchoTool(ToolId::Chat))]);
        let cancel = CancellationToken::new();

        let run = executor.run("اقرأ الملف", &cancel).await.unwrap();
        assert_eq!(run.tool, ToolId::Pdf);
        assert!(run.output.as_text().unwrap().starts_with("echo:"));
    }

    #[tokio::test]
    async fn pre_cancelled_token_yields_cancellation_run() {
        let executor = executor_with(&["chat"], vec![Arc::new(EchoTool(ToolId::Chat))]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let run = executor.run("مرحبا", &cancel).await.unwrap();
        assert_eq!(run.output, ToolOutput::text(CANCELLATION_NOTICE));
        assert!(run.memory_snapshot.contains("[cancelled]"));
    }

    #[tokio::test]
    async fn tool_failure_is_recorded_and_propagated() {
        let executor = executor_with(
            &["search"],
            vec![Arc::new(EchoTool(ToolId::Chat)), Arc::new(FailingTool)],
        );
        let cancel = CancellationToken::new();

        let err = executor.run("ابحث", &cancel).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(executor.memory().context().contains("[error]\nboom"));
    }

    #[tokio::test]
    async fn memory_accumulates_across_turns() {
        let executor = executor_with(
            &["chat", "chat"],
            vec![Arc::new(EchoTool(ToolId::Chat))],
        );
        let cancel = CancellationToken::new();

        executor.run("اسمي أحمد", &cancel).await.unwrap();
        let second = executor.run("ما اسمي؟", &cancel).await.unwrap();

        assert!(second.memory_snapshot.contains("اسمي أحمد"));
        assert!(second.memory_snapshot.contains("ما اسمي؟"));
        let text = second.output.as_text().unwrap();
        assert!(text.contains("اسمي أحمد"));
    }

    mod scenarios {
        use super::*;

        use crate::providers::MockImageProvider;
        use crate::tools::{ChatTool, ExplainCodeTool, GenerateImageTool};

        #[tokio::test]
        async fn explain_request_with_code_reaches_explain_tool() {
            let selector_provider = Arc::new(MockProvider::with_replies(["explain_code"]));
            let tool_provider = Arc::new(MockProvider::with_replies(["الكود بيطبع رسالة في الكونسول"]));
            let registry = ToolRegistry::new(vec![
                Arc::new(ExplainCodeTool::new(tool_provider)) as Arc<dyn Tool>,
                Arc::new(ChatTool::new(selector_provider.clone())),
            ])
            .unwrap();
            let executor = AgentExecutor::new(selector_provider, registry);
            let cancel = CancellationToken::new();

            let message = "اشرح الكود ده:\n```js\nconsole.log('hi')\n```";
            let run = executor.run(message, &cancel).await.unwrap();

            assert_eq!(run.tool, ToolId::ExplainCode);
            assert!(run.memory_snapshot.contains("[explain_code]"));
            assert!(run.memory_snapshot.contains("[tool_output]"));
        }

        #[tokio::test]
        async fn explain_request_without_code_skips_the_model() {
            let selector_provider = Arc::new(MockProvider::with_replies(["explain_code"]));
            let tool_provider = Arc::new(MockProvider::default());
            let registry = ToolRegistry::new(vec![
                Arc::new(ExplainCodeTool::new(tool_provider.clone())) as Arc<dyn Tool>,
                Arc::new(ChatTool::new(selector_provider.clone())),
            ])
            .unwrap();
            let executor = AgentExecutor::new(selector_provider, registry);
            let cancel = CancellationToken::new();

            let run = executor.run("اشرح الكود", &cancel).await.unwrap();

            assert!(run.output.as_text().unwrap().contains("ابعت الكود"));
            assert!(tool_provider.requests().is_empty());
        }

        #[tokio::test]
        async fn image_request_yields_image_without_payload_in_memory() {
            let selector_provider = Arc::new(MockProvider::with_replies(["generate_image"]));
            let translator = Arc::new(MockProvider::with_replies(["a white cat"]));
            let registry = ToolRegistry::new(vec![
                Arc::new(GenerateImageTool::new(
                    translator,
                    Arc::new(MockImageProvider::default()),
                )) as Arc<dyn Tool>,
                Arc::new(ChatTool::new(selector_provider.clone())),
            ])
            .unwrap();
            let executor = AgentExecutor::new(selector_provider, registry);
            let cancel = CancellationToken::new();

            let run = executor.run("ارسم قطة", &cancel).await.unwrap();

            assert_eq!(run.tool, ToolId::GenerateImage);
            assert!(matches!(run.output, ToolOutput::Image { .. }));
            assert!(run.memory_snapshot.contains("تم توليد الصورة بنجاح"));
            assert!(!run.memory_snapshot.contains("aGVsbG8="));
        }

        #[tokio::test]
        async fn boundary_reset_forgets_earlier_turns() {
            let executor = executor_with(
                &["chat", "chat"],
                vec![Arc::new(EchoTool(ToolId::Chat))],
            );
            let cancel = CancellationToken::new();

            executor.run("اسمي أحمد", &cancel).await.unwrap();
            executor.memory().clear();
            let run = executor.run("ما اسمي؟", &cancel).await.unwrap();

            assert!(!run.memory_snapshot.contains("أحمد"));
            assert!(run.memory_snapshot.contains("ما اسمي؟"));
        }
    }
}
