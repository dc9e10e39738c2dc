//! Request configuration types for chat-model calls.

use crate::Message;

/// A request to a chat model: messages plus the generation knobs the
/// voting engine actually exercises (temperature, max tokens).
///
/// This mirrors the external contract in the design notes:
/// `complete(prompt, model, temperature, max_tokens)`. `prompt` here is a
/// single human message; system instructions, when present, are a
/// separate message rather than a side channel.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub config: ChatConfig,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            config: ChatConfig::default(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }
}

/// Generation parameters. Only what the voting engine needs; providers are
/// free to ignore fields they don't support.
#[derive(Debug, Clone, Default)]
pub struct ChatConfig {
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
    pub model: Option<String>,
}
