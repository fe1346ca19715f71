// src/llm/invoker.rs
// Bounded invocation: one spawned task per generate call, waited on for at most `timeout`.
//
// The caller never waits past the timeout. What happens to the generate call
// afterwards is governed by `TimeoutPolicy`; tokio cannot pre-empt a task, so
// "cancel" only works for backends whose futures stop when dropped (HTTP ones do).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::provider::{LLMError, LLMProvider};
use crate::error::AnalysisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeoutPolicy {
    /// Signal the task's cancellation token so the request is dropped.
    #[default]
    Cancel,
    /// Stop waiting but let the request run to completion; its result is discarded.
    Abandon,
}

impl TimeoutPolicy {
    pub fn as_str(&self) -> &str {
        match self {
            TimeoutPolicy::Cancel => "cancel",
            TimeoutPolicy::Abandon => "abandon",
        }
    }
}

impl fmt::Display for TimeoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cancel" => Ok(TimeoutPolicy::Cancel),
            "abandon" => Ok(TimeoutPolicy::Abandon),
            _ => Err(format!("Unknown timeout policy: {}", s)),
        }
    }
}

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("timed out after {} seconds", .after.as_secs())]
    Timeout { after: Duration },

    #[error(transparent)]
    Failed(#[from] LLMError),

    #[error("generation task aborted: {0}")]
    Aborted(String),
}

impl From<InvokeError> for AnalysisError {
    fn from(err: InvokeError) -> Self {
        match err {
            InvokeError::Timeout { after } => AnalysisError::Timeout {
                seconds: after.as_secs(),
            },
            InvokeError::Failed(e) => AnalysisError::Invocation(e),
            InvokeError::Aborted(msg) => {
                AnalysisError::Invocation(LLMError::GenerationFailed(msg))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BoundedInvoker {
    policy: TimeoutPolicy,
}

impl BoundedInvoker {
    pub fn new(policy: TimeoutPolicy) -> Self {
        Self { policy }
    }

    /// Run `provider.generate(prompt)` on its own task and wait up to `timeout`.
    pub async fn invoke(
        &self,
        provider: Arc<dyn LLMProvider>,
        prompt: String,
        timeout: Duration,
    ) -> Result<String, InvokeError> {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let model = provider.model_name().to_string();

        let started = Instant::now();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => Err(LLMError::Cancelled),
                result = provider.generate(&prompt) => result,
            }
        });

        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(result)) => {
                debug!(model = %model, elapsed_ms = started.elapsed().as_millis() as u64, ok = result.is_ok(), "Invocation finished");
                result.map_err(InvokeError::Failed)
            }
            Ok(Err(join_err)) => Err(InvokeError::Aborted(join_err.to_string())),
            Err(_) => {
                warn!(
                    model = %model,
                    timeout_secs = timeout.as_secs_f64(),
                    policy = %self.policy,
                    "Invocation timed out"
                );
                if self.policy == TimeoutPolicy::Cancel {
                    token.cancel();
                }
                Err(InvokeError::Timeout { after: timeout })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct SlowProvider {
        delay: Duration,
        finished: Arc<AtomicBool>,
        dropped_early: Arc<AtomicBool>,
    }

    struct DropFlag {
        armed: bool,
        flag: Arc<AtomicBool>,
    }

    impl Drop for DropFlag {
        fn drop(&mut self) {
            if self.armed {
                self.flag.store(true, Ordering::SeqCst);
            }
        }
    }

    #[async_trait::async_trait]
    impl LLMProvider for SlowProvider {
        async fn generate(&self, _prompt: &str) -> Result<String, LLMError> {
            let mut guard = DropFlag {
                armed: true,
                flag: self.dropped_early.clone(),
            };
            tokio::time::sleep(self.delay).await;
            guard.armed = false;
            self.finished.store(true, Ordering::SeqCst);
            Ok("late answer".to_string())
        }

        fn model_name(&self) -> &str {
            "slow"
        }
    }

    struct FailingProvider;

    #[async_trait::async_trait]
    impl LLMProvider for FailingProvider {
        async fn generate(&self, _prompt: &str) -> Result<String, LLMError> {
            Err(LLMError::GenerationFailed("model crashed".to_string()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    fn slow(delay: Duration) -> (Arc<SlowProvider>, Arc<AtomicBool>, Arc<AtomicBool>) {
        let finished = Arc::new(AtomicBool::new(false));
        let dropped = Arc::new(AtomicBool::new(false));
        let provider = Arc::new(SlowProvider {
            delay,
            finished: finished.clone(),
            dropped_early: dropped.clone(),
        });
        (provider, finished, dropped)
    }

    #[tokio::test]
    async fn test_fast_call_returns_result() {
        let (provider, finished, _) = slow(Duration::from_millis(10));
        let result = BoundedInvoker::default()
            .invoke(provider, "prompt".to_string(), Duration::from_secs(5))
            .await;
        assert_eq!(result.unwrap(), "late answer");
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_timeout_returns_promptly() {
        let (provider, _, _) = slow(Duration::from_secs(30));
        let started = Instant::now();
        let result = BoundedInvoker::default()
            .invoke(provider, "prompt".to_string(), Duration::from_millis(100))
            .await;
        assert!(matches!(result, Err(InvokeError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_cancel_policy_drops_request() {
        let (provider, finished, dropped) = slow(Duration::from_secs(30));
        let result = BoundedInvoker::new(TimeoutPolicy::Cancel)
            .invoke(provider, "prompt".to_string(), Duration::from_millis(50))
            .await;
        assert!(result.is_err());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(dropped.load(Ordering::SeqCst));
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_abandon_policy_lets_request_finish() {
        let (provider, finished, dropped) = slow(Duration::from_millis(150));
        let result = BoundedInvoker::new(TimeoutPolicy::Abandon)
            .invoke(provider, "prompt".to_string(), Duration::from_millis(20))
            .await;
        assert!(matches!(result, Err(InvokeError::Timeout { .. })));

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(finished.load(Ordering::SeqCst));
        assert!(!dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let result = BoundedInvoker::default()
            .invoke(Arc::new(FailingProvider), "prompt".to_string(), Duration::from_secs(1))
            .await;
        match result {
            Err(InvokeError::Failed(LLMError::GenerationFailed(msg))) => {
                assert_eq!(msg, "model crashed")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("cancel".parse::<TimeoutPolicy>().unwrap(), TimeoutPolicy::Cancel);
        assert_eq!("ABANDON".parse::<TimeoutPolicy>().unwrap(), TimeoutPolicy::Abandon);
        assert!("ignore".parse::<TimeoutPolicy>().is_err());
    }

    #[test]
    fn test_timeout_converts_to_analysis_error() {
        let err: AnalysisError = InvokeError::Timeout {
            after: Duration::from_secs(180),
        }
        .into();
        assert!(matches!(err, AnalysisError::Timeout { seconds: 180 }));
    }
}
