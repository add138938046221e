use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::Client;

use crate::backend::{ChatBackend, MockChat, OpenAiBackend};
use crate::error::PipelineError;
use crate::search::{MockSearch, SerpApiSearch, WebSearch};

/// Builds provider clients bound to a session's API keys.
///
/// Keys arrive per session, so backends are created per report rather
/// than once at startup.
pub trait Connector: Send + Sync {
    fn chat(&self, api_key: &str) -> Arc<dyn ChatBackend>;

    fn search(&self, api_key: &str) -> Arc<dyn WebSearch>;
}

/// Connects to the real OpenAI and SerpAPI endpoints.
pub struct HttpConnector {
    client: Client,
    openai_base_url: String,
    serpapi_base_url: String,
}

impl HttpConnector {
    pub fn new(
        openai_base_url: &str,
        serpapi_base_url: &str,
        request_timeout: Duration,
    ) -> Result<Self, PipelineError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            openai_base_url: openai_base_url.to_string(),
            serpapi_base_url: serpapi_base_url.to_string(),
        })
    }
}

impl Connector for HttpConnector {
    fn chat(&self, api_key: &str) -> Arc<dyn ChatBackend> {
        Arc::new(OpenAiBackend::new(
            self.client.clone(),
            &self.openai_base_url,
            api_key,
        ))
    }

    fn search(&self, api_key: &str) -> Arc<dyn WebSearch> {
        Arc::new(SerpApiSearch::new(
            self.client.clone(),
            &self.serpapi_base_url,
            api_key,
        ))
    }
}

/// Hands out the same scripted backends for every key, remembering which
/// keys were asked for.
pub struct MockConnector {
    pub chat: Arc<MockChat>,
    pub search: Arc<MockSearch>,
    keys: Mutex<Vec<String>>,
}

impl MockConnector {
    pub fn new(chat: MockChat, search: MockSearch) -> Self {
        Self {
            chat: Arc::new(chat),
            search: Arc::new(search),
            keys: Mutex::new(Vec::new()),
        }
    }

    /// Keys passed to `chat` and `search`, in call order.
    pub fn keys_seen(&self) -> Vec<String> {
        self.keys.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, key: &str) {
        self.keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(key.to_string());
    }
}

impl Connector for MockConnector {
    fn chat(&self, api_key: &str) -> Arc<dyn ChatBackend> {
        self.record(api_key);
        self.chat.clone()
    }

    fn search(&self, api_key: &str) -> Arc<dyn WebSearch> {
        self.record(api_key);
        self.search.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_connector_builds_named_backends() {
        let connector = HttpConnector::new(
            "https://api.openai.com/v1",
            "https://serpapi.com",
            Duration::from_secs(30),
        )
        .unwrap();
        assert_eq!(connector.chat("sk").name(), "openai");
        assert_eq!(connector.search("serp").name(), "serpapi");
    }

    #[test]
    fn mock_connector_records_keys() {
        let connector = MockConnector::new(MockChat::new(), MockSearch::with_links(&[]));
        connector.chat("sk-model");
        connector.search("serp-key");
        assert_eq!(connector.keys_seen(), vec!["sk-model", "serp-key"]);
    }
}
