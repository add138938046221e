use birdwatch_prompts::research::SEARCH_TOOL_DESCRIPTION;
use birdwatch_prompts::{AgentPrompt, SEARCH_TOOL_NAME};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::backend::{ChatBackend, ChatMessage, ChatRequest, ContentPart, ToolCall, ToolSpec};
use crate::error::{PipelineError, Stage};
use crate::search::WebSearch;

const DEFAULT_NUM_RESULTS: usize = 10;

/// One agent invocation: a prompt, a model, and optionally the search tool.
pub struct AgentRun<'a> {
    pub stage: Stage,
    pub prompt: &'a AgentPrompt,
    pub model: &'a str,
    pub search: Option<&'a dyn WebSearch>,
    pub max_tool_rounds: usize,
}

#[derive(Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    num_results: Option<usize>,
}

/// JSON schema advertised for the search tool.
pub fn search_tool_spec() -> ToolSpec {
    ToolSpec {
        name: SEARCH_TOOL_NAME.to_string(),
        description: SEARCH_TOOL_DESCRIPTION.to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query."
                },
                "num_results": {
                    "type": "integer",
                    "description": "Number of results to return (default 10)."
                }
            },
            "required": ["query"]
        }),
    }
}

impl AgentRun<'_> {
    /// Send the user turn and keep answering tool calls until the model
    /// produces text. Returns that text unchanged.
    pub async fn run(
        &self,
        backend: &dyn ChatBackend,
        user: Vec<ContentPart>,
    ) -> Result<String, PipelineError> {
        let mut messages = vec![
            ChatMessage::System(self.prompt.system_message(Utc::now())),
            ChatMessage::User(user),
        ];
        let tools = match self.search {
            Some(_) => vec![search_tool_spec()],
            None => Vec::new(),
        };

        let mut rounds = 0;
        loop {
            let request = ChatRequest {
                model: self.model.to_string(),
                messages: messages.clone(),
                tools: tools.clone(),
            };
            let reply = backend.complete(&request).await?;

            if reply.tool_calls.is_empty() {
                return match reply.content {
                    Some(text) if !text.trim().is_empty() => Ok(text),
                    _ => Err(PipelineError::EmptyResponse(self.stage)),
                };
            }

            if rounds == self.max_tool_rounds {
                return Err(PipelineError::ToolLoop {
                    stage: self.stage,
                    rounds,
                });
            }
            rounds += 1;

            messages.push(ChatMessage::Assistant {
                content: reply.content.clone(),
                tool_calls: reply.tool_calls.clone(),
            });
            for call in &reply.tool_calls {
                let output = self.call_tool(call).await?;
                messages.push(ChatMessage::Tool {
                    call_id: call.id.clone(),
                    content: output,
                });
            }
        }
    }

    async fn call_tool(&self, call: &ToolCall) -> Result<String, PipelineError> {
        let search = match self.search {
            Some(search) if call.name == SEARCH_TOOL_NAME => search,
            _ => return Err(PipelineError::UnknownTool(call.name.clone())),
        };
        let args: SearchArgs = serde_json::from_str(&call.arguments)?;
        let num = args.num_results.unwrap_or(DEFAULT_NUM_RESULTS).clamp(1, DEFAULT_NUM_RESULTS);

        info!(
            "{}: {} searching \"{}\" via {}",
            self.stage,
            self.prompt.name,
            args.query,
            search.name()
        );
        let hits = search.search(&args.query, num).await?;
        debug!("{}: search returned {} results", self.stage, hits.len());
        Ok(serde_json::to_string(&hits)?)
    }
}
