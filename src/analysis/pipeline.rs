// src/analysis/pipeline.rs
// End-to-end run: chunk, analyze, consolidate, chart. Always yields a report body.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::analyzer::ChunkAnalyzer;
use super::consolidator::{Consolidation, Consolidator};
use super::findings::StructuredFindings;
use super::prompts::{AnalysisParameters, PromptLibrary};
use crate::chunker::{split_content, ContentChunk};
use crate::config::{AnalysisSettings, AppConfig};
use crate::llm::{BoundedInvoker, ModelGateway};
use crate::report::{render_visualizations, ChartRenderer, SvgChartRenderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Single chunk, or nothing worth merging.
    Complete,
    Consolidated,
    ConsolidationTimedOut,
    ConsolidationFailed,
    BackendUnavailable,
}

/// Final artifact of one run.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Report body; never empty, even when the backend was unusable.
    pub text: String,
    pub visualizations: Vec<PathBuf>,
    /// Findings the charts were drawn from.
    pub findings: Option<StructuredFindings>,
    pub status: OutcomeStatus,
    pub model: Option<String>,
}

pub struct AnalysisPipeline {
    gateway: ModelGateway,
    prompts: PromptLibrary,
    settings: AnalysisSettings,
    renderer: Arc<dyn ChartRenderer>,
}

impl AnalysisPipeline {
    pub fn new(
        gateway: ModelGateway,
        prompts: PromptLibrary,
        settings: AnalysisSettings,
        renderer: Arc<dyn ChartRenderer>,
    ) -> Self {
        Self {
            gateway,
            prompts,
            settings,
            renderer,
        }
    }

    /// Ollama gateway, today's prompts, SVG charts under the visualization dir.
    pub fn from_config(config: &AppConfig) -> Self {
        let renderer = SvgChartRenderer::new(config.analysis.visualization_dir.clone());
        Self::new(
            ModelGateway::ollama(config.gateway.clone()),
            PromptLibrary::dated_today(),
            config.analysis.clone(),
            Arc::new(renderer),
        )
    }

    pub fn prompts(&self) -> &PromptLibrary {
        &self.prompts
    }

    /// Split raw text with the configured chunk size, then analyze it.
    pub async fn analyze_content(&self, content: &str, params: &AnalysisParameters) -> AnalysisOutcome {
        let chunks: Vec<ContentChunk> = split_content(content, self.settings.max_chunk_chars)
            .into_iter()
            .map(ContentChunk::new)
            .collect();
        self.analyze_chunks(&chunks, params).await
    }

    pub async fn analyze_chunks(&self, chunks: &[ContentChunk], params: &AnalysisParameters) -> AnalysisOutcome {
        let invoker = BoundedInvoker::new(self.settings.timeout_policy);
        let analyzer = ChunkAnalyzer::new(&self.gateway, &self.prompts, invoker);

        info!(
            chunks = chunks.len(),
            industry = %params.industry,
            model = %self.settings.model,
            timeout_secs = self.settings.chunk_timeout.as_secs(),
            "Starting analysis"
        );

        let batch = match analyzer
            .analyze(chunks, params, &self.settings.model, self.settings.chunk_timeout)
            .await
        {
            Ok(batch) => batch,
            Err(e) => {
                warn!(error = %e, "Analysis aborted before any chunk was sent");
                return AnalysisOutcome {
                    text: e.to_report_markdown(self.gateway.backend_url()),
                    visualizations: Vec::new(),
                    findings: None,
                    status: OutcomeStatus::BackendUnavailable,
                    model: None,
                };
            }
        };

        let first_findings = batch.structured_list().into_iter().next();
        let consolidation = Consolidator::new(&self.prompts, invoker)
            .consolidate(&batch, params, self.settings.consolidation_timeout())
            .await;

        let (text, findings, status) = match consolidation {
            Consolidation::Skipped => (batch.combined_text(), first_findings, OutcomeStatus::Complete),
            Consolidation::Merged { text, findings } => (text, findings, OutcomeStatus::Consolidated),
            Consolidation::TimedOut { text } => {
                (text, first_findings, OutcomeStatus::ConsolidationTimedOut)
            }
            Consolidation::Failed { text, .. } => {
                (text, first_findings, OutcomeStatus::ConsolidationFailed)
            }
        };

        let text = if text.trim().is_empty() {
            warn!("Model returned no analysis text");
            format!(
                "# {} Industry Analysis\n\n*The model returned no analysis text for this content.*",
                params.industry
            )
        } else {
            text
        };

        let visualizations = match &findings {
            Some(findings) => render_visualizations(self.renderer.as_ref(), findings, &params.industry),
            None => {
                info!("No structured findings, skipping charts");
                Vec::new()
            }
        };

        info!(
            status = ?status,
            charts = visualizations.len(),
            model = batch.model.model_name(),
            "Analysis finished"
        );

        AnalysisOutcome {
            text,
            visualizations,
            findings,
            status,
            model: Some(batch.model.model_name().to_string()),
        }
    }
}
