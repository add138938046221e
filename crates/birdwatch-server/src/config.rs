use std::net::SocketAddr;
use std::time::Duration;

use birdwatch_pipeline::ModelSelection;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "birdwatch-server", about = "Bird Watch Companion web server")]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "BIRDWATCH_BIND", default_value = "127.0.0.1")]
    pub bind: String,

    /// Port to listen on
    #[arg(long, env = "BIRDWATCH_PORT", default_value = "3720")]
    pub port: u16,

    /// Base URL of the OpenAI-compatible chat API
    #[arg(
        long,
        env = "BIRDWATCH_OPENAI_BASE_URL",
        default_value = birdwatch_pipeline::backend::openai::DEFAULT_BASE_URL
    )]
    pub openai_base_url: String,

    /// Base URL of the SerpAPI search endpoint
    #[arg(
        long,
        env = "BIRDWATCH_SERPAPI_BASE_URL",
        default_value = birdwatch_pipeline::search::serpapi::DEFAULT_BASE_URL
    )]
    pub serpapi_base_url: String,

    /// Vision model used to identify the bird
    #[arg(long, env = "BIRDWATCH_IDENTIFY_MODEL", default_value = "gpt-4o")]
    pub identify_model: String,

    /// Model driving the web search step
    #[arg(long, env = "BIRDWATCH_RESEARCH_MODEL", default_value = "gpt-4o")]
    pub research_model: String,

    /// Model writing the final report
    #[arg(long, env = "BIRDWATCH_REPORT_MODEL", default_value = "o3-mini")]
    pub report_model: String,

    /// Timeout for each remote call (seconds).
    /// Reasoning models can take a while on the final report.
    #[arg(long, env = "BIRDWATCH_REQUEST_TIMEOUT", default_value = "180")]
    pub request_timeout: u64,

    /// Largest accepted upload (MiB)
    #[arg(
        long,
        env = "BIRDWATCH_MAX_UPLOAD_MB",
        default_value = "10",
        value_parser = clap::value_parser!(u32).range(1..=1024)
    )]
    pub max_upload_mb: u32,

    /// Maximum search tool rounds in the research step
    #[arg(long, env = "BIRDWATCH_MAX_TOOL_ROUNDS", default_value = "4")]
    pub max_tool_rounds: usize,

    /// Sessions idle this long are dropped, along with their keys and report (minutes)
    #[arg(
        long,
        env = "BIRDWATCH_SESSION_IDLE_MINUTES",
        default_value = "60",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub session_idle_minutes: u32,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(SocketAddr::new(self.bind.parse()?, self.port))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn max_upload_bytes(&self) -> usize {
        // At most 1 GiB, which fits a 32-bit usize.
        self.max_upload_mb as usize * 1024 * 1024
    }

    pub fn session_idle_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.session_idle_minutes))
    }

    pub fn models(&self) -> ModelSelection {
        ModelSelection {
            identify: self.identify_model.clone(),
            research: self.research_model.clone(),
            report: self.report_model.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::parse_from(["birdwatch-server"]);
        assert_eq!(config.port, 3720);
        assert_eq!(config.openai_base_url, "https://api.openai.com/v1");
        assert_eq!(config.serpapi_base_url, "https://serpapi.com");
        assert_eq!(config.models(), ModelSelection::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(180));
        assert_eq!(config.max_upload_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.session_idle_ttl(), chrono::Duration::minutes(60));
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:3720");
    }

    #[test]
    fn overrides() {
        let config = ServerConfig::parse_from([
            "birdwatch-server",
            "--port",
            "8080",
            "--report-model",
            "gpt-4o-mini",
            "--max-upload-mb",
            "2",
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.models().report, "gpt-4o-mini");
        assert_eq!(config.max_upload_bytes(), 2 * 1024 * 1024);
    }

    #[test]
    fn idle_minutes_must_be_positive() {
        for value in ["0", "-5"] {
            let parsed = ServerConfig::try_parse_from([
                "birdwatch-server",
                "--session-idle-minutes",
                value,
            ]);
            assert!(parsed.is_err(), "accepted {value}");
        }
        let config =
            ServerConfig::parse_from(["birdwatch-server", "--session-idle-minutes", "4294967295"]);
        assert_eq!(
            config.session_idle_ttl(),
            chrono::Duration::minutes(4_294_967_295)
        );
    }

    #[test]
    fn upload_limit_is_bounded() {
        for value in ["0", "1025", "18446744073709551615"] {
            let parsed =
                ServerConfig::try_parse_from(["birdwatch-server", "--max-upload-mb", value]);
            assert!(parsed.is_err(), "accepted {value}");
        }
        let config = ServerConfig::parse_from(["birdwatch-server", "--max-upload-mb", "1024"]);
        assert_eq!(config.max_upload_bytes(), 1024 * 1024 * 1024);
    }

    #[test]
    fn bad_bind_address_is_error() {
        let config = ServerConfig::parse_from(["birdwatch-server", "--bind", "not-an-ip"]);
        assert!(config.bind_addr().is_err());
    }
}
