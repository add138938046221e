use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use birdwatch_pipeline::{HttpConnector, ReportPipeline};
use birdwatch_server::config::ServerConfig;
use birdwatch_server::session::{run_sweeper, SessionStore};
use birdwatch_server::InnerAppState;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

/// How often the sweeper looks for idle sessions.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::parse();
    let addr = config.bind_addr()?;

    let connector = HttpConnector::new(
        &config.openai_base_url,
        &config.serpapi_base_url,
        config.request_timeout(),
    )?;
    let models = config.models();
    info!(
        "models: identify={} research={} report={}",
        models.identify, models.research, models.report
    );
    let pipeline = ReportPipeline::new(Arc::new(connector), models, config.max_tool_rounds);

    let sessions = Arc::new(SessionStore::new());
    tokio::spawn(run_sweeper(
        sessions.clone(),
        config.session_idle_ttl(),
        SWEEP_INTERVAL,
    ));

    let state = Arc::new(InnerAppState {
        pipeline,
        sessions,
        max_upload_bytes: config.max_upload_bytes(),
    });

    let listener = TcpListener::bind(addr).await?;
    info!("birdwatch-server listening on http://{addr}");
    birdwatch_server::serve(listener, state).await?;
    Ok(())
}
