// src/config.rs
// Process-wide settings, read once at startup and passed down explicitly
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::llm::TimeoutPolicy;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3:latest";
pub const DEFAULT_FALLBACK_MODELS: [&str; 3] = ["llama3:latest", "llama2:latest", "mistral:latest"];

/// How the Model Gateway finds and verifies a model.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub ollama_url: String,
    pub fallback_models: Vec<String>,
    pub retries: u32,
    pub backoff_base: u64,
    /// Budget for the `/api/tags` reachability check
    pub probe_timeout: Duration,
    /// Budget for the one-word smoke prompt sent to each candidate
    pub smoke_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            fallback_models: DEFAULT_FALLBACK_MODELS.iter().map(|m| m.to_string()).collect(),
            retries: 3,
            backoff_base: 2,
            probe_timeout: Duration::from_secs(5),
            smoke_timeout: Duration::from_secs(60),
        }
    }
}

/// Per-run analysis knobs.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub model: String,
    pub chunk_timeout: Duration,
    pub max_chunk_chars: usize,
    pub timeout_policy: TimeoutPolicy,
    pub visualization_dir: PathBuf,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            chunk_timeout: Duration::from_secs(180),
            max_chunk_chars: 4000,
            timeout_policy: TimeoutPolicy::Cancel,
            visualization_dir: PathBuf::from("visualizations"),
        }
    }
}

impl AnalysisSettings {
    /// Consolidation merges every chunk, so it gets twice the per-chunk budget.
    pub fn consolidation_timeout(&self) -> Duration {
        self.chunk_timeout.saturating_mul(2)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub analysis: AnalysisSettings,
    pub report_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            analysis: AnalysisSettings::default(),
            report_dir: PathBuf::from("reports"),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        if env::var("NO_DOTENV").is_err() {
            dotenvy::dotenv().ok();
        }

        let mut gateway = GatewayConfig::default();
        if let Ok(url) = env::var("OLLAMA_URL") {
            gateway.ollama_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(list) = env::var("FALLBACK_MODELS") {
            let models: Vec<String> = list
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
            if !models.is_empty() {
                gateway.fallback_models = models;
            }
        }
        gateway.retries = parse_env("MODEL_RETRIES", gateway.retries).max(1);
        gateway.backoff_base = parse_env("MODEL_BACKOFF_BASE", gateway.backoff_base);
        gateway.probe_timeout =
            Duration::from_secs(parse_env("PROBE_TIMEOUT_SECS", gateway.probe_timeout.as_secs()));
        gateway.smoke_timeout =
            Duration::from_secs(parse_env("SMOKE_TIMEOUT_SECS", gateway.smoke_timeout.as_secs()));

        let mut analysis = AnalysisSettings::default();
        if let Ok(model) = env::var("DEFAULT_MODEL") {
            analysis.model = model;
        }
        analysis.chunk_timeout = Duration::from_secs(positive_secs(
            "ANALYSIS_TIMEOUT_SECS",
            parse_env("ANALYSIS_TIMEOUT_SECS", analysis.chunk_timeout.as_secs()),
        ));
        analysis.max_chunk_chars = parse_env("MAX_CHUNK_CHARS", analysis.max_chunk_chars);
        if let Ok(raw) = env::var("TIMEOUT_POLICY") {
            match raw.parse() {
                Ok(policy) => analysis.timeout_policy = policy,
                Err(e) => tracing::warn!(error = %e, "Ignoring TIMEOUT_POLICY"),
            }
        }
        if let Ok(dir) = env::var("VISUALIZATION_DIR") {
            analysis.visualization_dir = PathBuf::from(dir);
        }

        let report_dir = env::var("REPORT_DIR").unwrap_or_else(|_| "reports".to_string());

        Self {
            gateway,
            analysis,
            report_dir: PathBuf::from(report_dir),
        }
    }
}

fn parse_env<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}

/// A zero timeout would expire every call immediately.
fn positive_secs(key: &str, secs: u64) -> u64 {
    if secs == 0 {
        tracing::warn!(key, "Timeout must be at least 1 second, using 1");
        1
    } else {
        secs
    }
}
