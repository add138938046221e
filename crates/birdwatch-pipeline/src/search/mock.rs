use std::sync::Mutex;

use async_trait::async_trait;

use super::{SearchHit, WebSearch};
use crate::error::PipelineError;

/// A canned search provider for tests. Records every query it receives.
pub struct MockSearch {
    hits: Vec<SearchHit>,
    failure: Option<(u16, String)>,
    queries: Mutex<Vec<String>>,
}

impl MockSearch {
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            failure: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Build hits from bare links, titled after their position.
    pub fn with_links(links: &[&str]) -> Self {
        Self::with_hits(
            links
                .iter()
                .enumerate()
                .map(|(i, link)| SearchHit {
                    title: format!("Result {}", i + 1),
                    link: link.to_string(),
                    snippet: None,
                })
                .collect(),
        )
    }

    pub fn failing(status: u16, message: &str) -> Self {
        Self {
            hits: Vec::new(),
            failure: Some((status, message.to_string())),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl WebSearch for MockSearch {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchHit>, PipelineError> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(query.to_string());
        if let Some((status, message)) = &self.failure {
            return Err(PipelineError::Api {
                provider: "mock",
                status: *status,
                message: message.clone(),
            });
        }
        Ok(self.hits.iter().take(num_results).cloned().collect())
    }
}
