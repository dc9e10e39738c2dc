//! Expand: free task text (+ optional clarifying answers) → an ordered,
//! duplicate-free set of atomic requirements (§4.4).

use std::sync::Arc;

use async_trait::async_trait;
use mdap_core::llm::ChatRequest;
use mdap_core::{ContextSnapshot, Message, Step};

use crate::error::Result;
use crate::llm_client::LlmClient;
use crate::voter::{CandidateGenerator, GeneratedSample};

use super::render_context_summary;

const EXPAND_PROMPT: &str = r#"Break the following task into an ordered list of atomic, testable requirements.

Task:
{task}

Context:
{context}

Respond with ONLY a JSON array of strings, one requirement per element, in priority order. Do not include explanations or markdown fences."#;

pub struct ExpandGenerator {
    client: Arc<LlmClient>,
    model_id: String,
    temperature: f32,
}

impl ExpandGenerator {
    pub fn new(client: Arc<LlmClient>, model_id: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model_id: model_id.into(),
            temperature,
        }
    }
}

#[async_trait]
impl CandidateGenerator for ExpandGenerator {
    async fn generate(&self, _step: &Step, snapshot: &ContextSnapshot) -> Result<GeneratedSample> {
        let prompt = EXPAND_PROMPT
            .replace("{task}", &snapshot.get().task)
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

/// Parse a winning Expand candidate into the ordered, duplicate-free
/// requirement list (§4.4: "duplicates collapsed by normalized string
/// equality; order is insertion order from winning candidate"). Lives
/// alongside the generator since it is Expand-specific, unlike the
/// generic red-flag JSON-array shape check.
pub fn parse_requirements(winning_text: &str) -> Vec<String> {
    let values: Vec<serde_json::Value> = match serde_json::from_str(winning_text.trim()) {
        Ok(serde_json::Value::Array(items)) => items,
        _ => return Vec::new(),
    };

    let mut seen = std::collections::HashSet::new();
    let mut requirements = Vec::new();
    for value in values {
        let Some(text) = value.as_str() else { continue };
        let normalized = text.trim().to_lowercase();
        if normalized.is_empty() || !seen.insert(normalized) {
            continue;
        }
        requirements.push(text.trim().to_string());
    }
    requirements
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
    async fn test_generate_renders_task_and_calls_model() {
        let model = ScriptedModel(r#"["must add two numbers"]"#.to_string());
        let client = Arc::new(LlmClient::new(Box::new(model), Default::default()));
        let generator = ExpandGenerator::new(client, "test-model", 0.2);

        let ctx = Context::new("build a calculator", "rust");
        let snapshot = ctx.snapshot();
        let step = Step::new(mdap_core::StepType::Expand, "expand requirements");

        let sample = generator.generate(&step, &snapshot).await.unwrap();
        assert_eq!(sample.text, r#"["must add two numbers"]"#);
    }

    #[test]
    fn test_parse_requirements_deduplicates_preserving_order() {
        let text = r#"["must be fast", "must be correct", "Must Be Fast"]"#;
        let reqs = parse_requirements(text);
        assert_eq!(reqs, vec!["must be fast", "must be correct"]);
    }

    #[test]
    fn test_parse_requirements_non_array_yields_empty() {
        assert!(parse_requirements("not json").is_empty());
        assert!(parse_requirements(r#"{"a": 1}"#).is_empty());
    }
}
