//! Response types returned by a [`crate::llm::ChatModel`] call.

use crate::Message;

/// Token accounting for a single completion, as required by the resource
/// manager's running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageMetadata {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl UsageMetadata {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// The result of a completed chat call.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub message: Message,
    pub usage: Option<UsageMetadata>,
}

impl ChatResponse {
    pub fn text(&self) -> &str {
        self.message.text()
    }
}
