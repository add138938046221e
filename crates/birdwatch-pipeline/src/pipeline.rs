use std::sync::Arc;
use std::time::Instant;

use birdwatch_core::{BirdProfile, BirdReport, Credentials, IdentificationResult, ResearchLinks};
use birdwatch_prompts::{guide, identify, research};
use tracing::info;

use crate::agent::AgentRun;
use crate::backend::{ChatBackend, ContentPart};
use crate::connector::Connector;
use crate::error::{PipelineError, Stage};
use crate::search::WebSearch;

/// Which model each stage talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub identify: String,
    pub research: String,
    pub report: String,
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self {
            identify: "gpt-4o".into(),
            research: "gpt-4o".into(),
            report: "o3-mini".into(),
        }
    }
}

/// Runs identification, research and synthesis in order, threading each
/// stage's text into the next.
pub struct ReportPipeline {
    connector: Arc<dyn Connector>,
    models: ModelSelection,
    max_tool_rounds: usize,
}

impl ReportPipeline {
    pub fn new(connector: Arc<dyn Connector>, models: ModelSelection, max_tool_rounds: usize) -> Self {
        Self {
            connector,
            models,
            max_tool_rounds,
        }
    }

    pub fn models(&self) -> &ModelSelection {
        &self.models
    }

    /// Produce a report for `profile`.
    ///
    /// Callers are expected to have checked that both keys and the image are
    /// present. Any remote failure ends the run; no stage is retried and no
    /// partial report is returned.
    pub async fn generate_report(
        &self,
        profile: &BirdProfile,
        credentials: &Credentials,
    ) -> Result<BirdReport, PipelineError> {
        let model_key = credentials
            .model_key()
            .ok_or(PipelineError::MissingCredential("model"))?;
        let search_key = credentials
            .search_key()
            .ok_or(PipelineError::MissingCredential("search"))?;

        let chat = self.connector.chat(model_key);
        let search = self.connector.search(search_key);
        let started = Instant::now();

        let identification = self.identify(chat.as_ref(), profile).await?;
        let links = self
            .research(chat.as_ref(), search.as_ref(), &identification)
            .await?;
        let report = self.synthesize(chat.as_ref(), &identification, &links).await?;

        info!(
            "report generated in {:.1}s ({} bytes)",
            started.elapsed().as_secs_f64(),
            report.as_str().len()
        );
        Ok(report)
    }

    /// Stage A: send the photo plus region and behavior to the vision model.
    pub async fn identify(
        &self,
        chat: &dyn ChatBackend,
        profile: &BirdProfile,
    ) -> Result<IdentificationResult, PipelineError> {
        let run = AgentRun {
            stage: Stage::Identification,
            prompt: &identify::AGENT,
            model: &self.models.identify,
            search: None,
            max_tool_rounds: 0,
        };
        let started = begin(&run);
        let text = run
            .run(
                chat,
                vec![
                    ContentPart::Text(identify::user_message(profile)),
                    ContentPart::ImageUrl(profile.image.data_url()),
                ],
            )
            .await?;
        let identification = IdentificationResult::new(text);
        info!(
            "identification: done in {:.1}s (common name: {})",
            started.elapsed().as_secs_f64(),
            identification.common_name().unwrap_or("unknown")
        );
        Ok(identification)
    }

    /// Stage B: let the research agent search the web for the species.
    pub async fn research(
        &self,
        chat: &dyn ChatBackend,
        search: &dyn WebSearch,
        identification: &IdentificationResult,
    ) -> Result<ResearchLinks, PipelineError> {
        let run = AgentRun {
            stage: Stage::Research,
            prompt: &research::AGENT,
            model: &self.models.research,
            search: Some(search),
            max_tool_rounds: self.max_tool_rounds,
        };
        let started = begin(&run);
        let text = run
            .run(
                chat,
                vec![ContentPart::Text(research::user_message(identification))],
            )
            .await?;
        info!("research: done in {:.1}s", started.elapsed().as_secs_f64());
        Ok(ResearchLinks::new(text))
    }

    /// Stage C: merge identification and links into the final report.
    pub async fn synthesize(
        &self,
        chat: &dyn ChatBackend,
        identification: &IdentificationResult,
        links: &ResearchLinks,
    ) -> Result<BirdReport, PipelineError> {
        let run = AgentRun {
            stage: Stage::Synthesis,
            prompt: &guide::AGENT,
            model: &self.models.report,
            search: None,
            max_tool_rounds: 0,
        };
        let started = begin(&run);
        let text = run
            .run(
                chat,
                vec![ContentPart::Text(guide::user_message(identification, links))],
            )
            .await?;
        info!("synthesis: done in {:.1}s", started.elapsed().as_secs_f64());
        Ok(BirdReport::new(text))
    }
}

fn begin(run: &AgentRun<'_>) -> Instant {
    info!(
        "{}: starting {} (model={})",
        run.stage, run.prompt.name, run.model
    );
    Instant::now()
}
