//! Configuration schema for the `mdap` CLI.

use mdap_core::MDAPConfig;
use mdap_engine::ResourceBudgets;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration, loaded from the dual-location TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MdapCliConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub mdap: VotingConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which LLM backend to talk to, per §6's client contract. Supports the
/// two providers `mdap-llm` implements: a local server (Ollama) and any
/// remote OpenAI-compatible endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// `"ollama"` or `"remote"`.
    pub provider: String,
    pub model: String,
    pub base_url: String,
    /// Name of the environment variable holding the API key, for
    /// `provider = "remote"`. Resolved at client-construction time, never
    /// stored in the config file itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "llama3".to_string(),
            base_url: "http://localhost:11434".to_string(),
            api_key_env: None,
            call_timeout_secs: default_call_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl LlmConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

fn default_call_timeout() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

/// Tunables for the voting engine (§3's `MDAPConfig`, one field per CLI
/// `Configuration` entry in §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingConfig {
    pub k: usize,
    pub max_samples: usize,
    pub max_tokens_response: usize,
    pub temperature: f32,
    pub max_depth: usize,
}

impl Default for VotingConfig {
    fn default() -> Self {
        let defaults = MDAPConfig::default();
        Self {
            k: defaults.k,
            max_samples: defaults.max_samples,
            max_tokens_response: defaults.max_tokens_response,
            temperature: defaults.temperature,
            max_depth: defaults.max_depth,
        }
    }
}

impl VotingConfig {
    /// Build the engine's `MDAPConfig`, filling in `model_id` from the LLM
    /// config since the two live in separate TOML tables here.
    pub fn to_mdap_config(&self, model_id: impl Into<String>) -> MDAPConfig {
        MDAPConfig::new()
            .with_k(self.k)
            .with_max_samples(self.max_samples)
            .with_max_tokens_response(self.max_tokens_response)
            .with_temperature(self.temperature)
            .with_max_depth(self.max_depth)
            .with_model_id(model_id)
    }
}

/// Optional hard resource limits, settable via the CLI's `budget <kind>
/// <value>` command (§6) as well as the config file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BudgetConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cost_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_time_secs: Option<u64>,
}

impl BudgetConfig {
    pub fn to_resource_budgets(&self) -> ResourceBudgets {
        ResourceBudgets {
            max_tokens: self.max_tokens,
            max_cost_usd: self.max_cost_usd,
            max_time: self.max_time_secs.map(Duration::from_secs),
        }
    }
}

/// Logging presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub colored: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
            colored: true,
        }
    }
}

impl MdapCliConfig {
    /// Merge another config into this one; `other`'s present top-level
    /// tables replace this config's (the loader calls this with
    /// defaults, then user config, then project config, each overriding
    /// the last).
    pub fn merge(&mut self, other: MdapCliConfig) {
        self.llm = other.llm;
        self.mdap = other.mdap;
        self.budget = other.budget;
        self.logging = other.logging;
    }
}
