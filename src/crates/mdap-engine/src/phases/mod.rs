//! Phase executors: Expand, Decompose, Generate, Validate.
//!
//! Grounded on `orchestrator/src/workflow/llm_executor.rs`'s
//! `LlmWorkflowExecutor`: one executor per step kind, each owning its own
//! prompt-building and response-parsing, composed on top of a shared LLM
//! client rather than duplicating the call machinery (§4.4: "all four
//! phases share the same machinery; only the prompt, parser, and
//! output-shape check differ").

pub mod decompose;
pub mod expand;
pub mod generate;
pub mod validate;

pub use decompose::DecomposeGenerator;
pub use expand::ExpandGenerator;
pub use generate::GenerateGenerator;
pub use validate::ValidateGenerator;

use mdap_core::ContextSnapshot;

/// Render the `{context}` placeholder shared by the Expand, Generate, and
/// Validate templates: a short summary of the run so far, built from the
/// immutable snapshot so every candidate in one vote sees identical text.
pub(crate) fn render_context_summary(snapshot: &ContextSnapshot) -> String {
    let ctx = snapshot.get();
    let requirements = if ctx.requirements.is_empty() {
        "  (none yet)".to_string()
    } else {
        ctx.requirements
            .iter()
            .map(|r| format!("  - {r}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let functions = if ctx.functions.is_empty() {
        "(none yet)".to_string()
    } else {
        ctx.functions
            .iter()
            .map(|f| f.signature.clone())
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "task: {}\nlanguage: {}\nrequirements:\n{}\nfunctions defined so far: {}",
        ctx.task, ctx.language, requirements, functions
    )
}
