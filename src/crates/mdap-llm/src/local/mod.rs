//! Local LLM provider implementations.
//!
//! Providers running on localhost or a local network. No API key, lower
//! latency, and the pipeline can run fully offline.

pub mod ollama;

pub use ollama::OllamaClient;
