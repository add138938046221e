pub mod mock;
pub mod serpapi;

pub use mock::MockSearch;
pub use serpapi::SerpApiSearch;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// One organic search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// A hosted web search provider, used as the research agent's tool.
#[async_trait]
pub trait WebSearch: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchHit>, PipelineError>;
}
