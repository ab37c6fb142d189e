use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::AgentError;
use crate::traits::{ChatMessage, ChatRequest, ImageProvider, Provider};

/// Scripted text provider for tests. Replies are consumed in order; an
/// exhausted script is a test bug and fails loudly.
#[derive(Default)]
pub struct MockProvider {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockProvider {
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every message list this provider has been called with, oldest first.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        request: ChatRequest<'_>,
        cancel: &CancellationToken,
    ) -> anyhow::Result<String> {
        if cancel.is_cancelled() {
            return Err(AgentError::Cancelled.into());
        }
        self.requests
            .lock()
            .unwrap()
            .push(request.messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("mock provider script exhausted"))
    }
}

/// Image provider that always returns the same base64 payload.
pub struct MockImageProvider {
    data: String,
}

impl MockImageProvider {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }
}

impl Default for MockImageProvider {
    fn default() -> Self {
        Self::new("aGVsbG8=")
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    async fn generate(&self, _prompt: &str, cancel: &CancellationToken) -> anyhow::Result<String> {
        if cancel.is_cancelled() {
            return Err(AgentError::Cancelled.into());
        }
        Ok(self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replies_are_consumed_in_order() {
        let provider = MockProvider::with_replies(["one", "two"]);
        let cancel = CancellationToken::new();
        let messages = [ChatMessage::user("hi")];

        let first = provider
            .complete(ChatRequest::new(&messages), &cancel)
            .await
            .unwrap();
        let second = provider
            .complete(ChatRequest::new(&messages), &cancel)
            .await
            .unwrap();
        assert_eq!(first, "one");
        assert_eq!(second, "two");

        let err = provider
            .complete(ChatRequest::new(&messages), &cancel)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exhausted"));
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let provider = MockProvider::with_replies(["unused"]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let messages = [ChatMessage::user("hi")];

        let err = provider
            .complete(ChatRequest::new(&messages), &cancel)
            .await
            .unwrap_err();
        assert!(AgentError::is_cancellation(&err));
        assert!(provider.requests().is_empty());
    }
}
