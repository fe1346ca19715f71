// src/analysis/consolidator.rs
// Second pass that merges every chunk analysis into one report

use std::time::Duration;

use tracing::{error, info};

use super::analyzer::BatchAnalysis;
use super::findings::StructuredFindings;
use super::parser::{clean_analysis_text, escape_angle_brackets, extract_structured};
use super::prompts::{AnalysisParameters, PromptLibrary};
use crate::error::AnalysisError;
use crate::llm::BoundedInvoker;

/// How the final report body came to be.
#[derive(Debug, Clone, PartialEq)]
pub enum Consolidation {
    /// Single chunk or nothing usable to merge; the combined text stands as is.
    Skipped,
    Merged {
        text: String,
        findings: Option<StructuredFindings>,
    },
    TimedOut {
        text: String,
    },
    Failed {
        text: String,
        error: String,
    },
}

impl Consolidation {
    pub fn text(&self) -> Option<&str> {
        match self {
            Consolidation::Skipped => None,
            Consolidation::Merged { text, .. }
            | Consolidation::TimedOut { text }
            | Consolidation::Failed { text, .. } => Some(text),
        }
    }
}

pub struct Consolidator<'a> {
    prompts: &'a PromptLibrary,
    invoker: BoundedInvoker,
}

impl<'a> Consolidator<'a> {
    pub fn new(prompts: &'a PromptLibrary, invoker: BoundedInvoker) -> Self {
        Self { prompts, invoker }
    }

    /// Only multi-chunk batches with at least one analyzed chunk are merged.
    pub fn should_consolidate(batch: &BatchAnalysis) -> bool {
        batch.chunk_count() > 1 && batch.has_successful_chunk()
    }

    pub async fn consolidate(
        &self,
        batch: &BatchAnalysis,
        params: &AnalysisParameters,
        timeout: Duration,
    ) -> Consolidation {
        if !Self::should_consolidate(batch) {
            return Consolidation::Skipped;
        }

        let combined = batch.combined_text();
        info!(
            chunks = batch.chunk_count(),
            timeout_secs = timeout.as_secs(),
            "Consolidating chunk analyses"
        );

        let prompt = self.prompts.consolidation_prompt(params, &combined);
        match self.invoker.invoke(batch.model.provider(), prompt, timeout).await {
            Ok(response) => {
                let findings = extract_structured(&response);
                Consolidation::Merged {
                    text: clean_analysis_text(&response),
                    findings,
                }
            }
            Err(e) => match AnalysisError::from(e) {
                AnalysisError::Timeout { seconds } => {
                    error!(timeout_secs = seconds, "Consolidation timed out");
                    Consolidation::TimedOut {
                        text: timeout_fallback(&params.industry, &combined),
                    }
                }
                err => {
                    error!(error = %err, hint = %err.recovery_hint(), "Consolidation failed");
                    let message = err.to_string();
                    Consolidation::Failed {
                        text: error_fallback(&params.industry, &combined, &message),
                        error: message,
                    }
                }
            },
        }
    }
}

fn timeout_fallback(industry: &str, combined: &str) -> String {
    format!(
        "# {} Industry Analysis\n\n*Note: Final consolidation could not be completed due to timeout.*\n\n{}",
        industry, combined
    )
}

fn error_fallback(industry: &str, combined: &str, message: &str) -> String {
    format!(
        "# {} Industry Analysis\n\n*Error during consolidation: {}*\n\n{}",
        industry,
        escape_angle_brackets(message),
        combined
    )
}
