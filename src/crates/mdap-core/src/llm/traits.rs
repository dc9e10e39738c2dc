//! The LLM client contract.
//!
//! This is the thin boundary between the voting engine and whatever model
//! serves completions. The engine never speaks to a provider directly; it
//! only ever calls [`ChatModel::chat`]. Concrete providers (remote HTTP
//! APIs, local model servers) live in `mdap-llm` and implement this trait.
//!
//! # Design Principles
//!
//! 1. **One method that matters**: `chat()` is the `complete(prompt, model,
//!    temperature, max_tokens)` operation. Everything else is a detail.
//! 2. **Retries are the caller's responsibility.** Implementations return
//!    an error; they do not retry internally. The engine's LLM client
//!    wrapper owns the retry/backoff policy.
//! 3. **Provider-agnostic**: local (Ollama, llama.cpp) and remote (hosted
//!    API) providers implement the same trait.
//!
//! # Example Implementation
//!
//! ```rust,ignore
//! use mdap_core::llm::{ChatModel, ChatRequest, ChatResponse};
//! use async_trait::async_trait;
//!
//! struct MyProvider { api_key: String }
//!
//! #[async_trait]
//! impl ChatModel for MyProvider {
//!     async fn chat(&self, request: ChatRequest) -> mdap_core::error::Result<ChatResponse> {
//!         todo!("call the provider, map its errors onto CoreError")
//!     }
//!
//!     fn clone_box(&self) -> Box<dyn ChatModel> {
//!         Box::new(MyProvider { api_key: self.api_key.clone() })
//!     }
//! }
//! ```

use crate::error::Result;
use crate::llm::config::ChatRequest;
use crate::llm::response::ChatResponse;
use async_trait::async_trait;

/// Core trait for chat-based language models.
///
/// Implementations must be `Send + Sync` so they can be shared as
/// `Arc<dyn ChatModel>` across concurrent candidate generation.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a complete chat response from messages.
    ///
    /// # Errors
    ///
    /// Implementations should map provider failures onto
    /// `CoreError::Timeout`, `CoreError::RateLimited`, or
    /// `CoreError::Transport` so the caller's retry policy can
    /// distinguish them.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Check if the provider is reachable. Default assumes yes; local
    /// providers (Ollama, llama.cpp) should override this to ping their
    /// server.
    async fn is_available(&self) -> Result<bool> {
        Ok(true)
    }

    /// Clone this model into a boxed trait object, enabling `Clone` for
    /// `Box<dyn ChatModel>`.
    fn clone_box(&self) -> Box<dyn ChatModel>;
}

impl Clone for Box<dyn ChatModel> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Message;
    use std::sync::Arc;

    #[derive(Clone)]
    struct MockModel {
        response_text: String,
    }

    #[async_trait]
    impl ChatModel for MockModel {
        async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse> {
            use crate::llm::response::UsageMetadata;

            Ok(ChatResponse {
                message: Message::ai(self.response_text.clone()),
                usage: Some(UsageMetadata {
                    input_tokens: 10,
                    output_tokens: 5,
                }),
            })
        }

        fn clone_box(&self) -> Box<dyn ChatModel> {
            Box::new(self.clone())
        }
    }

    #[tokio::test]
    async fn test_trait_object() {
        let model: Arc<dyn ChatModel> = Arc::new(MockModel {
            response_text: "Hello!".to_string(),
        });

        let request = ChatRequest::new(vec![Message::human("Hi")]);
        let response = model.chat(request).await.unwrap();

        assert_eq!(response.text(), "Hello!");
    }

    #[tokio::test]
    async fn test_default_is_available() {
        let model = MockModel {
            response_text: "test".to_string(),
        };

        assert!(model.is_available().await.unwrap());
    }

    #[test]
    fn test_clone_box() {
        let model: Box<dyn ChatModel> = Box::new(MockModel {
            response_text: "x".to_string(),
        });
        let cloned = model.clone();
        drop(model);
        drop(cloned);
    }
}
