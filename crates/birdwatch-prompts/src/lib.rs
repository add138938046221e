pub mod agent;
pub mod guide;
pub mod identify;
pub mod research;

pub use agent::AgentPrompt;
pub use research::SEARCH_TOOL_NAME;
