// src/error.rs
// Analysis error taxonomy and the remediation documents shown in place of a report

use std::io;
use thiserror::Error;

use crate::llm::LLMError;

/// Result type for pipeline operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    // Backend
    #[error("Cannot connect to Ollama server: {0}")]
    BackendUnreachable(String),

    #[error("No usable model after {attempts} attempt(s): {last_error}")]
    ModelUnavailable { attempts: u32, last_error: String },

    // Invocation
    #[error("Analysis timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Model invocation failed: {0}")]
    Invocation(#[from] LLMError),

    // Output
    #[error("Chart rendering failed for {chart}: {reason}")]
    Render { chart: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl AnalysisError {
    /// True for the errors that make a whole batch impossible.
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(
            self,
            AnalysisError::BackendUnreachable(_) | AnalysisError::ModelUnavailable { .. }
        )
    }

    /// Errors that only affect one chunk, one consolidation or one chart.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnalysisError::Timeout { .. }
                | AnalysisError::Invocation(_)
                | AnalysisError::Render { .. }
        )
    }

    pub fn recovery_hint(&self) -> String {
        match self {
            AnalysisError::BackendUnreachable(_) => {
                "Start the Ollama service with `ollama serve` and retry.".to_string()
            }
            AnalysisError::ModelUnavailable { .. } => {
                "Install a model with `ollama pull llama3` or `ollama pull mistral`.".to_string()
            }
            AnalysisError::Timeout { seconds } => format!(
                "Raise the timeout above {}s or lower the chunk size.",
                seconds
            ),
            AnalysisError::Invocation(_) => "Check the Ollama server logs.".to_string(),
            AnalysisError::Render { .. } => "Check the visualization directory.".to_string(),
            AnalysisError::Io(_) => "Check file permissions and paths.".to_string(),
        }
    }

    /// Markdown document rendered in place of the analysis when the backend is unusable.
    pub fn to_report_markdown(&self, backend_url: &str) -> String {
        match self {
            AnalysisError::BackendUnreachable(reason) => format!(
                "# Error Connecting to Ollama Server\n\n\
                 The application couldn't connect to the Ollama server. Error: {reason}\n\n\
                 ## Possible solutions:\n\
                 1. Ensure Ollama is installed - visit https://ollama.ai/download\n\
                 2. Start the Ollama service with `ollama serve` in a terminal\n\
                 3. Verify no firewall is blocking {backend_url}\n\n\
                 ## Troubleshooting Steps:\n\
                 1. Open a terminal and run: `curl {backend_url}/api/tags`\n\
                 2. If it returns a list of models, Ollama is running but may not have the required models\n\
                 3. Run: `ollama pull llama3` to download a model\n\n\
                 ## Temporary Analysis\n\
                 No analysis was performed. Please retry once Ollama is working properly.\n\n\
                 ### Key Market Trends\n\
                 - Unable to analyze data due to Ollama server connection error\n\
                 - Check the extracted content for insights manually\n"
            ),
            AnalysisError::ModelUnavailable { attempts, last_error } => format!(
                "# Error Initializing AI Model\n\n\
                 Unfortunately, there was an error initializing the local Ollama model \
                 after {attempts} attempt(s): {last_error}\n\n\
                 ## Possible solutions:\n\
                 1. Ensure Ollama is running properly with `ollama serve` command\n\
                 2. Check if you have the required models installed with `ollama list`\n\
                 3. Install needed models with `ollama pull llama3` or `ollama pull mistral`\n"
            ),
            other => format!(
                "# Analysis Failed\n\n{}\n\n## Possible solutions:\n1. {}\n",
                other,
                other.recovery_hint()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_errors_are_fatal() {
        let err = AnalysisError::BackendUnreachable("connection refused".to_string());
        assert!(err.is_backend_unavailable());
        assert!(!err.is_recoverable());

        let err = AnalysisError::Timeout { seconds: 30 };
        assert!(err.is_recoverable());
        assert!(!err.is_backend_unavailable());
    }

    #[test]
    fn test_unreachable_report_has_remediation() {
        let err = AnalysisError::BackendUnreachable("status 500".to_string());
        let doc = err.to_report_markdown("http://localhost:11434");
        assert!(doc.starts_with("# Error Connecting to Ollama Server"));
        assert!(doc.contains("ollama serve"));
        assert!(doc.contains("curl http://localhost:11434/api/tags"));
        assert!(doc.contains("status 500"));
    }

    #[test]
    fn test_model_unavailable_report() {
        let err = AnalysisError::ModelUnavailable {
            attempts: 3,
            last_error: "model returned empty response".to_string(),
        };
        let doc = err.to_report_markdown("http://localhost:11434");
        assert!(doc.contains("# Error Initializing AI Model"));
        assert!(doc.contains("ollama pull llama3"));
        assert!(doc.contains("3 attempt(s)"));
    }

    #[test]
    fn test_error_display() {
        let err = AnalysisError::Timeout { seconds: 180 };
        assert_eq!(err.to_string(), "Analysis timed out after 180 seconds");
    }
}
