//! The red-flag filter: cheap, local rejection of obviously invalid
//! candidates, applied before a candidate ever reaches the Discriminator.
//!
//! Grounded on `orchestrator/src/executor/parser.rs`'s `ResponseParser` —
//! its JSON/text extraction and strict-mode validation is the model for
//! the format/shape sub-check here (a shape violation is "strict mode"
//! for that one step, everything else stays best-effort).

use mdap_core::{MDAPConfig, Step, StepType};

/// The output shape a step's candidates are expected to satisfy, as named
/// in §4.1. `None` (no shape declared) disables the format sub-check but
/// not length/emptiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    JsonArray,
    JsonObject,
    YesNo,
    Code,
}

/// Map a step's type to the output shape its candidates must satisfy.
/// Expand and Decompose produce ordered JSON arrays; Generate produces a
/// single function definition (checked as code in `Context.language`);
/// Validate produces a JSON object; Decide (the discriminator's own
/// step) produces `YES|NO`.
pub fn expected_shape(step_type: StepType) -> Option<OutputShape> {
    match step_type {
        StepType::Expand | StepType::Decompose => Some(OutputShape::JsonArray),
        StepType::Generate => Some(OutputShape::Code),
        StepType::Validate => Some(OutputShape::JsonObject),
        StepType::Decide => Some(OutputShape::YesNo),
        _ => None,
    }
}

/// Pure, local predicate. Returns `Some(reason)` when the candidate must
/// be rejected without ever being shown to the Discriminator.
pub fn check(step: &Step, language: &str, text: &str, cfg: &MDAPConfig) -> Option<String> {
    if text.trim().is_empty() {
        return Some("empty or whitespace-only response".to_string());
    }

    let char_count = text.chars().count();
    if char_count > cfg.max_tokens_response {
        return Some(format!(
            "response length {} exceeds max_tokens_response {}",
            char_count, cfg.max_tokens_response
        ));
    }

    if let Some(shape) = expected_shape(step.step_type) {
        if let Some(reason) = check_shape(shape, language, text) {
            return Some(reason);
        }
    }

    None
}

fn check_shape(shape: OutputShape, language: &str, text: &str) -> Option<String> {
    match shape {
        OutputShape::JsonArray => match serde_json::from_str::<serde_json::Value>(text.trim()) {
            Ok(serde_json::Value::Array(_)) => None,
            Ok(_) => Some("expected a JSON array".to_string()),
            Err(e) => Some(format!("not valid JSON: {e}")),
        },
        OutputShape::JsonObject => match serde_json::from_str::<serde_json::Value>(text.trim()) {
            Ok(serde_json::Value::Object(_)) => None,
            Ok(_) => Some("expected a JSON object".to_string()),
            Err(e) => Some(format!("not valid JSON: {e}")),
        },
        OutputShape::YesNo => {
            let t = text.trim().to_lowercase();
            if t.starts_with("yes") || t.starts_with("no") {
                None
            } else {
                Some("expected a YES|NO response".to_string())
            }
        }
        OutputShape::Code => match advisory_parse(language, text) {
            Some(true) => None,
            Some(false) => Some(format!("failed to parse as {language} source")),
            // No parser registered for this language: the sub-check is
            // disabled, not failed.
            None => None,
        },
    }
}

/// A best-effort, advisory parse check. Absence of a parser for a
/// language disables this sub-check but not the others (§4.1). Real
/// language parsers are an external collaborator (§1); this is a
/// balanced-delimiter heuristic, not a compiler front end, and only
/// claims to cover languages it recognizes by name.
fn advisory_parse(language: &str, text: &str) -> Option<bool> {
    let normalized = language.trim().to_lowercase();
    let recognized = matches!(
        normalized.as_str(),
        "rust" | "python" | "javascript" | "typescript" | "go" | "java" | "c" | "cpp" | "c++"
    );
    if !recognized {
        return None;
    }
    Some(balanced_delimiters(text))
}

fn balanced_delimiters(text: &str) -> bool {
    let mut stack = Vec::new();
    let mut in_string: Option<char> = None;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if let Some(quote) = in_string {
            if c == '\\' {
                chars.next();
            } else if c == quote {
                in_string = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => in_string = Some(c),
            '(' | '[' | '{' => stack.push(c),
            ')' => {
                if stack.pop() != Some('(') {
                    return false;
                }
            }
            ']' => {
                if stack.pop() != Some('[') {
                    return false;
                }
            }
            '}' => {
                if stack.pop() != Some('{') {
                    return false;
                }
            }
            _ => {}
        }
    }
    stack.is_empty() && in_string.is_none()
}
