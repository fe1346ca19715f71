// src/llm/provider.rs
// LLM Provider abstraction - one blocking "generate" call per prompt
// Default: Ollama /api/generate

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// LLM Provider trait - implement this to support new backends
#[async_trait::async_trait]
pub trait LLMProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LLMError>;
    fn model_name(&self) -> &str;
}

/// Error types for LLM operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LLMError {
    #[error("LLM connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Ollama API returned status code {0}")]
    BackendStatus(u16),

    #[error("Invalid LLM response: {0}")]
    InvalidResponse(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Model {0} not found in available models")]
    ModelNotFound(String),

    #[error("Model {0} returned empty response")]
    EmptyResponse(String),

    #[error("Generation cancelled")]
    Cancelled,
}

/// Ollama-based LLM provider
pub struct OllamaProvider {
    url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: Option<String>,
}

impl OllamaProvider {
    pub fn new(url: String, model: String) -> Self {
        Self::with_client(url, model, reqwest::Client::new())
    }

    pub fn with_client(url: String, model: String, client: reqwest::Client) -> Self {
        Self { url, model, client }
    }
}

#[async_trait::async_trait]
impl LLMProvider for OllamaProvider {
    async fn generate(&self, prompt: &str) -> Result<String, LLMError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "Generating with Ollama");

        let url = format!("{}/api/generate", self.url);
        let req = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&req)
            .send()
            .await
            .map_err(|e| LLMError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LLMError::ConnectionFailed(e.to_string()))?;

        // Ollama reports model errors as `{"error": ...}`, often with a non-200 status.
        let ollama_resp: OllamaResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => return Err(LLMError::BackendStatus(status.as_u16())),
            Err(e) => return Err(LLMError::InvalidResponse(e.to_string())),
        };

        if let Some(message) = ollama_resp.error {
            return Err(LLMError::GenerationFailed(message));
        }
        if !status.is_success() {
            return Err(LLMError::BackendStatus(status.as_u16()));
        }

        info!(model = %self.model, response_len = ollama_resp.response.len(), "Generation complete");
        Ok(ollama_resp.response.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_provider_creation() {
        let provider = OllamaProvider::new(
            "http://localhost:11434".to_string(),
            "llama3:latest".to_string(),
        );
        assert_eq!(provider.model_name(), "llama3:latest");
    }

    #[test]
    fn test_llm_error_display() {
        let err = LLMError::ConnectionFailed("test".to_string());
        assert!(format!("{}", err).contains("connection failed"));
        assert_eq!(
            LLMError::BackendStatus(500).to_string(),
            "Ollama API returned status code 500"
        );
    }

    #[test]
    fn test_response_error_field_parses() {
        let resp: OllamaResponse =
            serde_json::from_str(r#"{"error":"model 'phi' not found"}"#).unwrap();
        assert_eq!(resp.response, "");
        assert_eq!(resp.error.as_deref(), Some("model 'phi' not found"));
    }
}
