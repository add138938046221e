use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatBackend, ChatReply, ChatRequest, ToolCall};
use crate::error::PipelineError;

enum Scripted {
    Reply(ChatReply),
    Fail { status: u16, message: String },
}

/// A scripted chat backend for tests.
///
/// Replies are handed out in order, one per `complete` call, and every
/// request is recorded for later inspection.
#[derive(Default)]
pub struct MockChat {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a plain text reply.
    pub fn then_text(self, content: &str) -> Self {
        self.push(Scripted::Reply(ChatReply::text(content)))
    }

    /// Queue a reply that asks for one tool call.
    pub fn then_tool_call(self, id: &str, name: &str, arguments: &str) -> Self {
        self.push(Scripted::Reply(ChatReply {
            content: None,
            tool_calls: vec![ToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments: arguments.to_string(),
            }],
        }))
    }

    /// Queue a provider error with the given HTTP status.
    pub fn then_error(self, status: u16, message: &str) -> Self {
        self.push(Scripted::Fail {
            status,
            message: message.to_string(),
        })
    }

    fn push(self, item: Scripted) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(item);
        self
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl ChatBackend for MockChat {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, PipelineError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match next {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Fail { status, message }) => Err(PipelineError::Api {
                provider: "mock",
                status,
                message,
            }),
            None => Err(PipelineError::Api {
                provider: "mock",
                status: 500,
                message: "no scripted reply left".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o".into(),
            messages: vec![],
            tools: vec![],
        }
    }

    #[tokio::test]
    async fn replies_in_order() {
        let mock = MockChat::new().then_text("one").then_text("two");
        assert_eq!(
            mock.complete(&request()).await.unwrap().content.as_deref(),
            Some("one")
        );
        assert_eq!(
            mock.complete(&request()).await.unwrap().content.as_deref(),
            Some("two")
        );
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn scripted_error() {
        let mock = MockChat::new().then_error(401, "bad key");
        let err = mock.complete(&request()).await.unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn exhausted_script_fails() {
        let mock = MockChat::new();
        assert!(mock.complete(&request()).await.is_err());
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn tool_call_reply() {
        let mock = MockChat::new().then_tool_call("call_1", "search_google", "{}");
        let reply = mock.complete(&request()).await.unwrap();
        assert_eq!(reply.content, None);
        assert_eq!(reply.tool_calls[0].name, "search_google");
    }

    #[test]
    fn name_is_mock() {
        assert_eq!(MockChat::new().name(), "mock");
    }
}
