// src/llm/backend.rs
// The local inference service: reachability, model listing, provider construction

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use super::provider::{LLMError, LLMProvider, OllamaProvider};

#[async_trait::async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Reachability check plus the identifiers of the installed models.
    async fn list_models(&self) -> Result<Vec<String>, LLMError>;

    /// Build a (not yet verified) provider for one model.
    fn provider(&self, model: &str) -> Arc<dyn LLMProvider>;

    fn base_url(&self) -> &str;
}

pub struct OllamaBackend {
    url: String,
    client: reqwest::Client,
    probe_timeout: Duration,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

impl OllamaBackend {
    pub fn new(url: impl Into<String>, probe_timeout: Duration) -> Self {
        let url: String = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            probe_timeout,
        }
    }
}

#[async_trait::async_trait]
impl InferenceBackend for OllamaBackend {
    async fn list_models(&self) -> Result<Vec<String>, LLMError> {
        let tags_url = format!("{}/api/tags", self.url);
        let response = self
            .client
            .get(&tags_url)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| {
                LLMError::ConnectionFailed(format!("Cannot reach Ollama at {}: {}", self.url, e))
            })?;

        if response.status() != reqwest::StatusCode::OK {
            warn!(status = response.status().as_u16(), "Ollama tags endpoint not healthy");
            return Err(LLMError::BackendStatus(response.status().as_u16()));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| LLMError::InvalidResponse(e.to_string()))?;
        let models: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
        debug!(?models, "Available Ollama models");
        Ok(models)
    }

    fn provider(&self, model: &str) -> Arc<dyn LLMProvider> {
        Arc::new(OllamaProvider::with_client(
            self.url.clone(),
            model.to_string(),
            self.client.clone(),
        ))
    }

    fn base_url(&self) -> &str {
        &self.url
    }
}

/// Model identifier without its version tag: `llama3:latest` -> `llama3`.
pub fn base_model_name(model: &str) -> &str {
    model.split(':').next().unwrap_or(model)
}

/// True when `model` (ignoring tag) is among `available`.
pub fn is_model_available(model: &str, available: &[String]) -> bool {
    let wanted = base_model_name(model);
    available.iter().any(|m| base_model_name(m) == wanted)
}
