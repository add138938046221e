pub mod mock;
pub mod openai;

pub use mock::MockChat;
pub use openai::OpenAiBackend;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::PipelineError;

/// One piece of a user turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    /// An image URL; uploaded photos are sent as `data:` URLs.
    ImageUrl(String),
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON arguments, as produced by the model.
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatMessage {
    System(String),
    User(Vec<ContentPart>),
    Assistant {
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        call_id: String,
        content: String,
    },
}

/// A function the model may call, described by a JSON schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolSpec>,
}

/// The assistant's reply: text, tool calls, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl ChatReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }
}

/// A hosted chat model.
///
/// Implementations send one request and return one reply; tool execution
/// and multi-turn looping live in [`crate::agent`].
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, PipelineError>;
}
