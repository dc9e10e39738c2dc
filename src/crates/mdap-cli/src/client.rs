//! Builds the boxed `ChatModel` the engine talks to, from CLI config.
//!
//! Grounded on `mdap-llm`'s two provider implementations; this module's
//! job is only the small `provider` string -> concrete type dispatch that
//! `mdap-llm` itself deliberately doesn't own (it has no opinion on CLI
//! configuration shape).

use mdap_core::llm::ChatModel;
use mdap_llm::local::OllamaClient;
use mdap_llm::remote::HttpChatClient;
use mdap_llm::{LocalLlmConfig, RemoteLlmConfig};

use crate::config::LlmConfig;
use crate::error::{CliError, Result};

/// Construct the `ChatModel` named by `cfg.provider`.
pub fn build_chat_model(cfg: &LlmConfig) -> Result<Box<dyn ChatModel>> {
    match cfg.provider.as_str() {
        "ollama" | "local" => {
            let local = LocalLlmConfig::new(cfg.base_url.clone(), cfg.model.clone())
                .with_timeout(cfg.call_timeout())
                .with_max_retries(cfg.max_retries);
            Ok(Box::new(OllamaClient::new(local)))
        }
        "remote" => {
            let env_var = cfg
                .api_key_env
                .as_deref()
                .ok_or_else(|| CliError::Config("remote provider requires llm.api_key_env".to_string()))?;
            let remote = RemoteLlmConfig::from_env(env_var, cfg.base_url.clone(), cfg.model.clone())?
                .with_timeout(cfg.call_timeout())
                .with_max_retries(cfg.max_retries);
            Ok(Box::new(HttpChatClient::new(remote)))
        }
        other => Err(CliError::Config(format!("unknown llm.provider '{other}' (expected 'ollama' or 'remote')"))),
    }
}
