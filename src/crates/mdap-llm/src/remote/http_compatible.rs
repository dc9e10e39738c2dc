//! Generic client for hosted providers that speak the OpenAI-compatible
//! chat-completions wire format (`POST {base_url}/chat/completions`, Bearer
//! auth). Many hosted APIs implement this shape, so one client covers them
//! by pointing `base_url` and `model` at the provider in question.
//!
//! # Example
//!
//! ```rust,ignore
//! use mdap_llm::remote::HttpChatClient;
//! use mdap_llm::config::RemoteLlmConfig;
//! use mdap_core::llm::{ChatModel, ChatRequest};
//! use mdap_core::Message;
//!
//! let config = RemoteLlmConfig::from_env(
//!     "MDAP_LLM_API_KEY",
//!     "https://api.example.com/v1",
//!     "some-model"
//! )?;
//! let client = HttpChatClient::new(config);
//!
//! let request = ChatRequest::new(vec![Message::human("Hello!")]);
//! let response = client.chat(request).await?;
//! ```

use crate::config::RemoteLlmConfig;
use crate::error::LlmError;
use async_trait::async_trait;
use mdap_core::error::Result as CoreResult;
use mdap_core::llm::{ChatModel, ChatRequest, ChatResponse, UsageMetadata};
use mdap_core::{Message, MessageRole};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Client for OpenAI-compatible hosted chat-completion APIs.
#[derive(Clone)]
pub struct HttpChatClient {
    config: RemoteLlmConfig,
    client: Client,
}

impl HttpChatClient {
    /// Create a new client with the given configuration.
    pub fn new(config: RemoteLlmConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to build HTTP client");

        Self { config, client }
    }

    fn convert_message(&self, msg: &Message) -> WireMessage {
        WireMessage {
            role: match msg.role {
                MessageRole::System => "system".to_string(),
                MessageRole::Human => "user".to_string(),
                MessageRole::Assistant => "assistant".to_string(),
            },
            content: msg.text().to_string(),
        }
    }

    fn convert_response(&self, wire_resp: WireResponse) -> crate::error::Result<ChatResponse> {
        let choice = wire_resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("response had no choices".to_string()))?;

        let message = Message::ai(choice.message.content);
        let usage = wire_resp.usage.map(|u| UsageMetadata {
            input_tokens: u.prompt_tokens as u64,
            output_tokens: u.completion_tokens as u64,
        });

        Ok(ChatResponse { message, usage })
    }
}

#[async_trait]
impl ChatModel for HttpChatClient {
    async fn chat(&self, request: ChatRequest) -> CoreResult<ChatResponse> {
        let url = format!("{}/chat/completions", self.config.base_url);

        let messages: Vec<WireMessage> = request
            .messages
            .iter()
            .map(|m| self.convert_message(m))
            .collect();

        let req_body = WireRequest {
            model: request.config.model.clone().unwrap_or_else(|| self.config.model.clone()),
            messages,
            temperature: request.config.temperature,
            max_tokens: request.config.max_tokens,
            stream: false,
        };

        let mut req = self.client.post(&url).json(&req_body);
        req = req.header("Authorization", format!("Bearer {}", self.config.api_key));
        if let Some(org) = &self.config.organization {
            req = req.header("OpenAI-Organization", org);
        }

        let response = req.send().await.map_err(LlmError::HttpError)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(if status.as_u16() == 401 {
                LlmError::AuthenticationError(error_text)
            } else if status.as_u16() == 429 {
                LlmError::RateLimitExceeded(error_text)
            } else {
                LlmError::ProviderError(format!("provider returned {status}: {error_text}"))
            }
            .into());
        }

        let wire_resp: WireResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(self.convert_response(wire_resp)?)
    }

    fn clone_box(&self) -> Box<dyn ChatModel> {
        Box::new(self.clone())
    }
}

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = RemoteLlmConfig::new("test-key", "https://api.example.com/v1", "some-model");
        let _client = HttpChatClient::new(config);
    }

    #[test]
    fn test_message_conversion() {
        let config = RemoteLlmConfig::new("test-key", "https://api.example.com/v1", "some-model");
        let client = HttpChatClient::new(config);

        let msg = Message::human("Hello");
        let wire_msg = client.convert_message(&msg);

        assert_eq!(wire_msg.role, "user");
        assert_eq!(wire_msg.content, "Hello");
    }

    #[test]
    fn test_convert_response_requires_a_choice() {
        let config = RemoteLlmConfig::new("test-key", "https://api.example.com/v1", "some-model");
        let client = HttpChatClient::new(config);

        let err = client
            .convert_response(WireResponse {
                choices: vec![],
                usage: None,
            })
            .unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }
}
