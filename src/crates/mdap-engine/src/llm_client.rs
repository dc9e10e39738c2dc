//! The per-call timeout and retry wrapper around a [`ChatModel`].
//!
//! Grounded on `orchestrator/src/executor/retry.rs`'s `ErrorClass` /
//! `RetryConfig` / exponential-backoff-with-jitter shape, re-pointed at
//! `mdap_core::CoreError` instead of `OrchestratorError` and narrowed to
//! the one retry trigger §5 actually names: a request timeout gets one
//! retry budget of up to `max_retries` attempts; everything else is
//! surfaced immediately as a lost sample, not retried.

use std::time::Duration;

use mdap_core::error::CoreError;
use mdap_core::llm::{ChatModel, ChatRequest, ChatResponse};
use tracing::{debug, warn};

use crate::error::{EngineError, Result};

/// Transient errors are worth a retry; permanent ones are surfaced
/// immediately so the sample is lost without wasting the retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Transient,
    Permanent,
}

pub fn classify_error(error: &CoreError) -> ErrorClass {
    match error {
        CoreError::Timeout(_) | CoreError::RateLimited(_) | CoreError::Transport(_) => {
            ErrorClass::Transient
        }
        CoreError::Validation(_) | CoreError::Serialization(_) | CoreError::Configuration(_) => {
            ErrorClass::Permanent
        }
        CoreError::Custom(_) => ErrorClass::Permanent,
    }
}

/// Per-call timeout and exponential backoff, as named in §5: default 60s
/// timeout, up to 3 attempts total, base delay 1s.
#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for LlmClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_retries: 2,
            base_backoff: Duration::from_secs(1),
        }
    }
}

impl LlmClientConfig {
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(attempt)
    }
}

/// Wraps any [`ChatModel`] with the timeout/retry policy the voting
/// engine relies on. The Voter never calls a `ChatModel` directly.
pub struct LlmClient {
    model: Box<dyn ChatModel>,
    config: LlmClientConfig,
}

impl LlmClient {
    pub fn new(model: Box<dyn ChatModel>, config: LlmClientConfig) -> Self {
        Self { model, config }
    }

    /// Issue one logical request, retrying transient failures (including
    /// a timed-out attempt) up to `max_retries` times with exponential
    /// backoff. A persistent failure is returned as an `EngineError` —
    /// the caller (the Voter) treats it as a lost sample, not a vote
    /// failure.
    pub async fn complete(&self, request: ChatRequest) -> Result<ChatResponse> {
        let mut attempt = 0;
        loop {
            let outcome = tokio::time::timeout(self.config.timeout, self.model.chat(request.clone())).await;

            let result = match outcome {
                Ok(inner) => inner,
                Err(_) => Err(CoreError::Timeout(self.config.timeout)),
            };

            match result {
                Ok(response) => return Ok(response),
                Err(err) => {
                    let class = classify_error(&err);
                    if class == ErrorClass::Permanent || attempt >= self.config.max_retries {
                        warn!(attempt, ?class, "llm request failed permanently: {err}");
                        return Err(EngineError::Core(err));
                    }
                    let delay = self.config.backoff_delay(attempt);
                    debug!(attempt, ?delay, "retrying llm request after transient error: {err}");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mdap_core::llm::UsageMetadata;
    use mdap_core::Message;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone)]
    struct FlakyModel {
        fail_times: usize,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ChatModel for FlakyModel {
        async fn chat(&self, _request: ChatRequest) -> mdap_core::error::Result<ChatResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_times {
                return Err(CoreError::RateLimited("slow down".to_string()));
            }
            Ok(ChatResponse {
                message: Message::ai("ok"),
                usage: Some(UsageMetadata {
                    input_tokens: 1,
                    output_tokens: 1,
                }),
            })
        }

        fn clone_box(&self) -> Box<dyn ChatModel> {
            Box::new(self.clone())
        }
    }

    #[derive(Clone)]
    struct AlwaysPermanent;

    #[async_trait]
    impl ChatModel for AlwaysPermanent {
        async fn chat(&self, _request: ChatRequest) -> mdap_core::error::Result<ChatResponse> {
            Err(CoreError::Validation("bad request shape".to_string()))
        }

        fn clone_box(&self) -> Box<dyn ChatModel> {
            Box::new(self.clone())
        }
    }

    fn fast_config() -> LlmClientConfig {
        LlmClientConfig {
            timeout: Duration::from_millis(200),
            max_retries: 2,
            base_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let model = FlakyModel {
            fail_times: 2,
            calls: calls.clone(),
        };
        let client = LlmClient::new(Box::new(model), fast_config());
        let response = client
            .complete(ChatRequest::new(vec![Message::human("hi")]))
            .await
            .unwrap();
        assert_eq!(response.text(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let client = LlmClient::new(Box::new(AlwaysPermanent), fast_config());
        let err = client
            .complete(ChatRequest::new(vec![Message::human("hi")]))
            .await
            .unwrap_err();
        match err {
            EngineError::Core(CoreError::Validation(_)) => {}
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exhausts_retries_on_persistent_transient_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let model = FlakyModel {
            fail_times: usize::MAX,
            calls: calls.clone(),
        };
        let client = LlmClient::new(Box::new(model), fast_config());
        let err = client
            .complete(ChatRequest::new(vec![Message::human("hi")]))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::RateLimited(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3); // initial attempt + 2 retries = 3 attempts total
    }

    #[test]
    fn test_backoff_delay_doubles() {
        let cfg = LlmClientConfig::default();
        assert_eq!(cfg.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(cfg.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(cfg.backoff_delay(2), Duration::from_secs(4));
    }
}
