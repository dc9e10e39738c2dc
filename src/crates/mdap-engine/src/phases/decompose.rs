//! Decompose: a requirement list → an ordered list of function records
//! `{signature, description, dependencies, requirement_ids}` (§4.4).

use std::sync::Arc;

use async_trait::async_trait;
use mdap_core::llm::ChatRequest;
use mdap_core::{ContextSnapshot, FunctionRecord, Message, Step};

use crate::error::Result;
use crate::llm_client::LlmClient;
use crate::voter::{CandidateGenerator, GeneratedSample};

const DECOMPOSE_PROMPT: &str = r#"Based on the following requirements, produce an ordered list of function records needed to implement them.

Requirements:
{requirements}

Language: {language}

Respond with ONLY a JSON array of objects, each with fields "signature", "description", "dependencies" (an array of signatures of other functions in this same list that must be defined first), and "requirement_ids" (an array of 0-based indices into the requirements list above).

Each function's "dependencies" must only reference signatures that appear EARLIER in this same array."#;

pub struct DecomposeGenerator {
    client: Arc<LlmClient>,
    model_id: String,
    temperature: f32,
}

impl DecomposeGenerator {
    pub fn new(client: Arc<LlmClient>, model_id: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model_id: model_id.into(),
            temperature,
        }
    }
}

#[async_trait]
impl CandidateGenerator for DecomposeGenerator {
    async fn generate(&self, _step: &Step, snapshot: &ContextSnapshot) -> Result<GeneratedSample> {
        let ctx = snapshot.get();
        let requirements = ctx
            .requirements
            .iter()
            .enumerate()
            .map(|(i, r)| format!("{i}. {r}"))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = DECOMPOSE_PROMPT
            .replace("{requirements}", &requirements)
            .replace("{language}", &ctx.language);

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

/// The Decompose phase's post-vote invariant (§4.4): every function's
/// `dependencies` must be a subset of the signatures listed earlier in the
/// same candidate. Used as the Voter's `extra_check` so a violation is
/// rejected exactly like a red flag, before the candidate ever reaches
/// the Discriminator.
pub fn check_topological_order(text: &str) -> Option<String> {
    let records = match parse_function_records(text) {
        Ok(records) => records,
        Err(_) => return None, // shape already enforced by the generic JSON-array red flag
    };

    let mut seen_signatures = std::collections::HashSet::new();
    for record in &records {
        for dependency in &record.dependencies {
            if !seen_signatures.contains(dependency) {
                return Some(format!(
                    "function '{}' depends on '{}', which is not defined earlier in this list",
                    record.signature, dependency
                ));
            }
        }
        seen_signatures.insert(record.signature.clone());
    }
    None
}

/// Parse a winning Decompose candidate into its function records.
pub fn parse_function_records(text: &str) -> std::result::Result<Vec<FunctionRecord>, serde_json::Error> {
    #[derive(serde::Deserialize)]
    struct RawRecord {
        signature: String,
        description: String,
        #[serde(default)]
        dependencies: Vec<String>,
        #[serde(default)]
        requirement_ids: Vec<usize>,
    }

    let raw: Vec<RawRecord> = serde_json::from_str(text.trim())?;
    Ok(raw
        .into_iter()
        .map(|r| FunctionRecord {
            signature: r.signature,
            description: r.description,
            dependencies: r.dependencies,
            requirement_ids: r.requirement_ids,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdap_core::llm::{ChatModel, ChatResponse};
    use mdap_core::Context;

    #[derive(Clone)]
    struct ScriptedModel(String);

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn chat(&self, _request: ChatRequest) -> mdap_core::error::Result<ChatResponse> {
            Ok(ChatResponse {
                message: Message::ai(self.0.clone()),
                usage: None,
            })
        }

        fn clone_box(&self) -> Box<dyn ChatModel> {
            Box::new(self.clone())
        }
    }

    #[tokio::test]
    async fn test_generate_includes_requirements_and_language() {
        let model = ScriptedModel("[]".to_string());
        let client = Arc::new(LlmClient::new(Box::new(model), Default::default()));
        let generator = DecomposeGenerator::new(client, "test-model", 0.2);

        let mut ctx = Context::new("build a calculator", "rust");
        ctx.append_requirement("supports addition");
        let snapshot = ctx.snapshot();
        let step = Step::new(mdap_core::StepType::Decompose, "decompose");

        let sample = generator.generate(&step, &snapshot).await.unwrap();
        assert_eq!(sample.text, "[]");
    }

    #[test]
    fn test_valid_topological_order_accepted() {
        let text = r#"[
            {"signature": "fn add(a, b)", "description": "adds", "dependencies": [], "requirement_ids": [0]},
            {"signature": "fn sum_all(xs)", "description": "sums", "dependencies": ["fn add(a, b)"], "requirement_ids": [0]}
        ]"#;
        assert!(check_topological_order(text).is_none());
    }

    #[test]
    fn test_forward_reference_rejected() {
        let text = r#"[
            {"signature": "fn sum_all(xs)", "description": "sums", "dependencies": ["fn add(a, b)"], "requirement_ids": [0]},
            {"signature": "fn add(a, b)", "description": "adds", "dependencies": [], "requirement_ids": [0]}
        ]"#;
        assert!(check_topological_order(text).is_some());
    }

    #[test]
    fn test_parse_function_records() {
        let text = r#"[{"signature": "fn add(a, b)", "description": "adds", "dependencies": [], "requirement_ids": [0, 1]}]"#;
        let records = parse_function_records(text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].signature, "fn add(a, b)");
        assert_eq!(records[0].requirement_ids, vec![0, 1]);
    }
}
