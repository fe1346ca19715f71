// src/llm/gateway.rs
// Model Gateway: verify the backend, pick a working model, retry with backoff

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use super::backend::{is_model_available, InferenceBackend, OllamaBackend};
use super::provider::{LLMError, LLMProvider};
use crate::config::GatewayConfig;
use crate::error::AnalysisError;

const SMOKE_PROMPT: &str = "Hello";

/// A model that answered the smoke prompt. Only the gateway creates these.
#[derive(Clone)]
pub struct ModelHandle {
    provider: Arc<dyn LLMProvider>,
}

impl ModelHandle {
    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    pub(crate) fn provider(&self) -> Arc<dyn LLMProvider> {
        Arc::clone(&self.provider)
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("model", &self.model_name())
            .finish()
    }
}

pub struct ModelGateway {
    backend: Arc<dyn InferenceBackend>,
    config: GatewayConfig,
}

impl ModelGateway {
    pub fn new(backend: Arc<dyn InferenceBackend>, config: GatewayConfig) -> Self {
        Self { backend, config }
    }

    /// Gateway talking to the Ollama server named in `config`.
    pub fn ollama(config: GatewayConfig) -> Self {
        let backend = OllamaBackend::new(config.ollama_url.clone(), config.probe_timeout);
        Self::new(Arc::new(backend), config)
    }

    pub fn backend_url(&self) -> &str {
        self.backend.base_url()
    }

    /// Single reachability check; returns the installed models.
    pub async fn check_backend(&self) -> Result<Vec<String>, AnalysisError> {
        self.backend.list_models().await.map_err(|e| {
            error!(error = %e, url = self.backend_url(), "Ollama backend unreachable");
            AnalysisError::BackendUnreachable(e.to_string())
        })
    }

    /// Find a working model, preferring `preferred_model`.
    ///
    /// Each attempt re-lists the models and walks the candidates in order; a
    /// failed attempt sleeps `backoff_base ^ attempt` seconds before the next.
    pub async fn acquire(&self, preferred_model: &str) -> Result<ModelHandle, AnalysisError> {
        let retries = self.config.retries.max(1);
        let mut last_error = String::new();

        for attempt in 0..retries {
            match self.try_candidates(preferred_model).await {
                Ok(handle) => return Ok(handle),
                Err(e) => {
                    last_error = e.to_string();
                    if attempt + 1 < retries {
                        let secs = self.config.backoff_base.saturating_pow(attempt);
                        warn!(
                            attempt = attempt + 1,
                            error = %e,
                            retry_in_secs = secs,
                            "Model initialization failed, retrying"
                        );
                        tokio::time::sleep(Duration::from_secs(secs)).await;
                    }
                }
            }
        }

        error!(attempts = retries, error = %last_error, "Failed to initialize Ollama");
        Err(AnalysisError::ModelUnavailable {
            attempts: retries,
            last_error,
        })
    }

    fn candidates(&self, preferred_model: &str) -> Vec<String> {
        let mut candidates = vec![preferred_model.to_string()];
        for model in &self.config.fallback_models {
            if !candidates.contains(model) {
                candidates.push(model.clone());
            }
        }
        candidates
    }

    async fn try_candidates(&self, preferred_model: &str) -> Result<ModelHandle, LLMError> {
        // An unreachable backend fails the whole attempt.
        let available = self.backend.list_models().await?;
        let mut last_error = None;

        for candidate in self.candidates(preferred_model) {
            if !is_model_available(&candidate, &available) {
                warn!(model = %candidate, "Model not found in available models");
                last_error = Some(LLMError::ModelNotFound(candidate));
                continue;
            }

            info!(model = %candidate, "Attempting to initialize Ollama model");
            let provider = self.backend.provider(&candidate);
            let smoke =
                tokio::time::timeout(self.config.smoke_timeout, provider.generate(SMOKE_PROMPT))
                    .await;

            match smoke {
                Ok(Ok(text)) if !text.trim().is_empty() => {
                    info!(model = %candidate, "Successfully initialized Ollama model");
                    return Ok(ModelHandle { provider });
                }
                Ok(Ok(_)) => {
                    warn!(model = %candidate, "Model returned empty response");
                    last_error = Some(LLMError::EmptyResponse(candidate));
                }
                Ok(Err(e)) => {
                    warn!(model = %candidate, error = %e, "Failed to initialize model");
                    last_error = Some(e);
                }
                Err(_) => {
                    warn!(model = %candidate, "Smoke prompt timed out");
                    last_error = Some(LLMError::GenerationFailed(format!(
                        "smoke prompt to {} timed out",
                        candidate
                    )));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            LLMError::GenerationFailed("no model candidates configured".to_string())
        }))
    }
}
