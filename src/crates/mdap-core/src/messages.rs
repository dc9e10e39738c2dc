//! Message types for LLM chat requests and responses.
//!
//! A minimal conversational message model: one role, one text body. The
//! voting engine only ever sends single-turn or short system+human
//! exchanges to the discriminator and phase executors, so this stays far
//! smaller than a general-purpose multimodal message system.

use serde::{Deserialize, Serialize};

/// Identifies the speaker of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions or context for the model.
    System,
    /// Input from the orchestrator (prompts built from templates).
    Human,
    /// A generated response from the model.
    Assistant,
}

/// A single message in a chat-style LLM request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Human,
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.content
    }
}
