//! Validate: final code body + specification → `{valid, errors, warnings}`
//! (§4.4). Non-fatal: a failing validation is reported, not an automatic
//! transition to ERROR (that's an orchestrator policy choice, §4.4).

use std::sync::Arc;

use async_trait::async_trait;
use mdap_core::llm::ChatRequest;
use mdap_core::{ContextSnapshot, Message, Step};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::llm_client::LlmClient;
use crate::voter::{CandidateGenerator, GeneratedSample};

use super::render_context_summary;

const VALIDATE_PROMPT: &str = r#"Check whether the following code satisfies its specification.

Code:
{code}

Specification:
{specification}

Context:
{context}

Respond with ONLY a JSON object: {"valid": true|false, "errors": [...], "warnings": [...]}. "errors" lists specification violations; "warnings" lists style or robustness concerns that do not violate the specification."#;

/// The parsed outcome of a winning Validate candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

pub struct ValidateGenerator {
    client: Arc<LlmClient>,
    model_id: String,
    temperature: f32,
}

impl ValidateGenerator {
    pub fn new(client: Arc<LlmClient>, model_id: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model_id: model_id.into(),
            temperature,
        }
    }
}

#[async_trait]
impl CandidateGenerator for ValidateGenerator {
    async fn generate(&self, step: &Step, snapshot: &ContextSnapshot) -> Result<GeneratedSample> {
        let code = step.target.as_deref().unwrap_or_default();
        let prompt = VALIDATE_PROMPT
            .replace("{code}", code)
            .replace("{specification}", &step.specification)
            .replace("{context}", &render_context_summary(snapshot));

        let request = ChatRequest::new(vec![Message::human(prompt)])
            .with_temperature(self.temperature)
            .with_model(self.model_id.clone());

        let response = self.client.complete(request).await?;
        let mut sample = GeneratedSample::new(response.text(), self.model_id.clone());
        if let Some(usage) = response.usage {
            sample = sample.with_usage(usage);
        }
        Ok(sample)
    }
}

/// Parse a winning Validate candidate. The generic red-flag filter already
/// guarantees the winner is a JSON object; a missing or wrongly-typed
/// `valid` field still degrades to a conservative `valid: false` rather
/// than panicking.
pub fn parse_validation_outcome(text: &str) -> ValidationOutcome {
    serde_json::from_str(text.trim()).unwrap_or(ValidationOutcome {
        valid: false,
        errors: vec!["validation response could not be parsed".to_string()],
        warnings: Vec::new(),
    })
}
