//! Remote LLM provider implementations.
//!
//! A single generic client for hosted providers that speak the
//! OpenAI-compatible chat-completions wire format, which covers most
//! hosted chat-completion APIs in practice.

pub mod http_compatible;

pub use http_compatible::HttpChatClient;
