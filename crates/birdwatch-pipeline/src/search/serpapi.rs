use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use super::{SearchHit, WebSearch};
use crate::error::PipelineError;

pub const DEFAULT_BASE_URL: &str = "https://serpapi.com";

const PROVIDER: &str = "SerpAPI";

/// Google search through SerpAPI's `search.json` endpoint.
pub struct SerpApiSearch {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SerpApiSearch {
    pub fn new(client: Client, base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn search_url(&self, query: &str, num_results: usize) -> Result<Url, PipelineError> {
        let num = num_results.to_string();
        Url::parse_with_params(
            &format!("{}/search.json", self.base_url),
            &[
                ("engine", "google"),
                ("q", query),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
            ],
        )
        .map_err(|e| PipelineError::Api {
            provider: PROVIDER,
            status: 0,
            message: format!("invalid search URL: {e}"),
        })
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    link: Option<String>,
    snippet: Option<String>,
}

#[async_trait]
impl WebSearch for SerpApiSearch {
    fn name(&self) -> &str {
        "serpapi"
    }

    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchHit>, PipelineError> {
        let url = self.search_url(query, num_results)?;
        // The query string carries the key; keep it out of error messages.
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();
        let body = response.text().await.map_err(reqwest::Error::without_url)?;
        parse_response(status.as_u16(), &body, num_results)
    }
}

fn parse_response(status: u16, body: &str, limit: usize) -> Result<Vec<SearchHit>, PipelineError> {
    let parsed: Result<SearchResponse, _> = serde_json::from_str(body);
    if !(200..300).contains(&status) {
        let message = parsed
            .ok()
            .and_then(|r| r.error)
            .unwrap_or_else(|| body.to_string());
        return Err(PipelineError::Api {
            provider: PROVIDER,
            status,
            message,
        });
    }

    let parsed = parsed?;
    // SerpAPI reports some failures (e.g. no results) with a 200 and an error field.
    if parsed.organic_results.is_empty() {
        if let Some(message) = parsed.error {
            if !message.contains("hasn't returned any results") {
                return Err(PipelineError::Api {
                    provider: PROVIDER,
                    status,
                    message,
                });
            }
        }
    }

    Ok(parsed
        .organic_results
        .into_iter()
        .filter_map(|r| {
            Some(SearchHit {
                title: r.title,
                link: r.link?,
                snippet: r.snippet,
            })
        })
        .take(limit)
        .collect())
}
