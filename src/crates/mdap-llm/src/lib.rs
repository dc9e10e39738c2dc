//! LLM provider implementations for the MDAP voting engine.
//!
//! Concrete implementations of [`mdap_core::llm::ChatModel`]: a local
//! provider (Ollama) and a generic remote provider for any hosted API that
//! speaks the OpenAI-compatible chat-completions format. The voting engine
//! depends only on the trait; which of these backs it is a deployment
//! choice.
//!
//! # Example Usage
//!
//! ## Local Provider (Ollama)
//!
//! ```rust,ignore
//! use mdap_llm::local::OllamaClient;
//! use mdap_llm::config::LocalLlmConfig;
//! use mdap_core::llm::{ChatModel, ChatRequest};
//! use mdap_core::Message;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LocalLlmConfig::new("http://localhost:11434", "llama3");
//!     let client = OllamaClient::new(config);
//!
//!     let request = ChatRequest::new(vec![Message::human("What is Rust?")]);
//!     let response = client.chat(request).await?;
//!     println!("Response: {}", response.text());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Remote Provider
//!
//! ```rust,ignore
//! use mdap_llm::remote::HttpChatClient;
//! use mdap_llm::config::RemoteLlmConfig;
//! use mdap_core::llm::{ChatModel, ChatRequest};
//! use mdap_core::Message;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RemoteLlmConfig::from_env(
//!         "MDAP_LLM_API_KEY",
//!         "https://api.example.com/v1",
//!         "some-model"
//!     )?;
//!     let client = HttpChatClient::new(config);
//!
//!     let request = ChatRequest::new(vec![
//!         Message::human("Explain quantum computing briefly")
//!     ]).with_temperature(0.7);
//!
//!     let response = client.chat(request).await?;
//!     println!("Response: {}", response.text());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;

#[cfg(feature = "local")]
pub mod local;

#[cfg(feature = "remote")]
pub mod remote;

pub use config::{LocalLlmConfig, RemoteLlmConfig};
pub use error::{LlmError, Result};

// Re-export mdap-core's LLM contract types for convenience.
pub use mdap_core::llm::{ChatConfig, ChatModel, ChatRequest, ChatResponse, UsageMetadata};
pub use mdap_core::Message;
