use std::fmt;

use thiserror::Error;

/// One step of the report pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Identification,
    Research,
    Synthesis,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Identification => "identification",
            Stage::Research => "research",
            Stage::Synthesis => "synthesis",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while talking to the model or search provider.
///
/// None of these are retried; they end the current report.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned {status}: {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("JSON serialization/deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} stage returned an empty response")]
    EmptyResponse(Stage),

    #[error("{stage} stage still requesting tools after {rounds} rounds")]
    ToolLoop { stage: Stage, rounds: usize },

    #[error("model requested unknown tool: {0}")]
    UnknownTool(String),

    #[error("missing {0} API key")]
    MissingCredential(&'static str),
}

impl PipelineError {
    /// True when the provider rejected the API key.
    pub fn is_auth(&self) -> bool {
        matches!(self, PipelineError::Api { status: 401 | 403, .. })
    }
}
