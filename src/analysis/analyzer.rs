// src/analysis/analyzer.rs
// Runs every chunk through the model, one bounded call at a time, in document order

use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use super::findings::StructuredFindings;
use super::parser::{clean_analysis_text, escape_angle_brackets, extract_structured};
use super::prompts::{AnalysisParameters, PromptLibrary};
use crate::chunker::ContentChunk;
use crate::error::AnalysisError;
use crate::llm::{BoundedInvoker, ModelGateway, ModelHandle};

/// Outcome of one chunk. Failed chunks carry their inline marker as text.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkResult {
    pub raw_text: String,
    pub structured_data: Option<StructuredFindings>,
    pub failed: bool,
}

impl ChunkResult {
    fn analyzed(text: String, structured_data: Option<StructuredFindings>) -> Self {
        Self {
            raw_text: text,
            structured_data,
            failed: false,
        }
    }

    fn failed(marker: String) -> Self {
        Self {
            raw_text: marker,
            structured_data: None,
            failed: true,
        }
    }
}

/// All chunk results of a run, plus the model that produced them.
#[derive(Debug)]
pub struct BatchAnalysis {
    pub model: ModelHandle,
    pub results: Vec<ChunkResult>,
}

impl BatchAnalysis {
    /// Per-chunk texts joined by blank lines, in chunk order.
    pub fn combined_text(&self) -> String {
        self.results
            .iter()
            .map(|r| r.raw_text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn structured_list(&self) -> Vec<StructuredFindings> {
        self.results
            .iter()
            .filter_map(|r| r.structured_data.clone())
            .collect()
    }

    pub fn chunk_count(&self) -> usize {
        self.results.len()
    }

    pub fn has_successful_chunk(&self) -> bool {
        self.results.iter().any(|r| !r.failed)
    }
}

pub struct ChunkAnalyzer<'a> {
    gateway: &'a ModelGateway,
    prompts: &'a PromptLibrary,
    invoker: BoundedInvoker,
}

impl<'a> ChunkAnalyzer<'a> {
    pub fn new(gateway: &'a ModelGateway, prompts: &'a PromptLibrary, invoker: BoundedInvoker) -> Self {
        Self {
            gateway,
            prompts,
            invoker,
        }
    }

    /// Backend reachability, then model acquisition. Either failure aborts the batch.
    pub async fn preflight(&self, model: &str) -> Result<ModelHandle, AnalysisError> {
        self.gateway.check_backend().await?;
        self.gateway.acquire(model).await
    }

    pub async fn analyze(
        &self,
        chunks: &[ContentChunk],
        params: &AnalysisParameters,
        model: &str,
        timeout: Duration,
    ) -> Result<BatchAnalysis, AnalysisError> {
        let handle = self.preflight(model).await?;
        let results = self.analyze_chunks(&handle, chunks, params, timeout).await;
        Ok(BatchAnalysis {
            model: handle,
            results,
        })
    }

    /// One chunk's failure never stops the others.
    pub async fn analyze_chunks(
        &self,
        handle: &ModelHandle,
        chunks: &[ContentChunk],
        params: &AnalysisParameters,
        timeout: Duration,
    ) -> Vec<ChunkResult> {
        let total = chunks.len();
        let mut results = Vec::with_capacity(total);

        for (i, chunk) in chunks.iter().enumerate() {
            let number = i + 1;
            info!(chunk = number, total, model = handle.model_name(), "Analyzing chunk");
            let started = Instant::now();

            let prompt = self.prompts.chunk_prompt(params, &chunk.prompt_content());
            let result = match self.invoker.invoke(handle.provider(), prompt, timeout).await {
                Ok(response) => {
                    let findings = extract_structured(&response);
                    if findings.is_none() {
                        warn!(chunk = number, "No structured data in chunk response");
                    }
                    ChunkResult::analyzed(clean_analysis_text(&response), findings)
                }
                Err(e) => match AnalysisError::from(e) {
                    AnalysisError::Timeout { seconds } => {
                        error!(chunk = number, timeout_secs = seconds, "Chunk analysis timed out");
                        ChunkResult::failed(timeout_marker(number, seconds))
                    }
                    err => {
                        error!(chunk = number, error = %err, hint = %err.recovery_hint(), "Error analyzing chunk");
                        ChunkResult::failed(error_marker(number, &err.to_string()))
                    }
                },
            };

            info!(
                chunk = number,
                failed = result.failed,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Chunk done"
            );
            results.push(result);
        }

        results
    }
}

pub fn timeout_marker(chunk: usize, seconds: u64) -> String {
    format!(
        "## Analysis Timeout for Content Chunk {}\n\nThe analysis took too long to complete (timeout after {} seconds).",
        chunk, seconds
    )
}

pub fn error_marker(chunk: usize, message: &str) -> String {
    format!(
        "## Error Analyzing Content Chunk {}\n\nThere was an error processing this section: {}",
        chunk,
        escape_angle_brackets(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers() {
        let marker = timeout_marker(2, 180);
        assert!(marker.starts_with("## Analysis Timeout for Content Chunk 2"));
        assert!(marker.contains("timeout after 180 seconds"));

        let marker = error_marker(1, "bad <html> reply");
        assert!(marker.contains("There was an error processing this section: bad &lt;html&gt; reply"));
    }

    #[test]
    fn test_combined_text_keeps_order() {
        let batch_results = vec![
            ChunkResult::analyzed("first".to_string(), None),
            ChunkResult::failed(timeout_marker(2, 5)),
            ChunkResult::analyzed("third".to_string(), None),
        ];
        let joined: Vec<&str> = batch_results.iter().map(|r| r.raw_text.as_str()).collect();
        assert_eq!(joined[0], "first");
        assert!(batch_results[1].failed);
        assert!(batch_results.iter().any(|r| !r.failed));
    }
}
