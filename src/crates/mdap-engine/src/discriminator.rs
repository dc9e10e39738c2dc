//! The Discriminator: a pairwise semantic-equivalence query against the
//! same LLM the voting engine samples candidates from.
//!
//! Grounded on `orchestrator/src/router/llm_router.rs`'s template-fill,
//! call, parse-with-conservative-fallback shape (`PATTERN_SELECTION_PROMPT`
//! + `parse_llm_response`): the template here asks `YES`/`NO` instead of a
//! pattern id, and an unparseable or off-contract response falls back to
//! `NO` rather than a rule-based router, since "keep groups separate under
//! uncertainty" is itself the conservative default (§4.2).

use std::sync::Arc;

use mdap_core::llm::ChatRequest;
use mdap_core::{ContextSnapshot, Message};
use tracing::{debug, warn};

use crate::error::Result;
use crate::llm_client::LlmClient;

const DISCRIMINATE_PROMPT: &str = r#"You are judging whether two candidate outputs for the same task are behaviorally equivalent.

Task context:
{context}

Candidate A:
{code_a}

Candidate B:
{code_b}

Ignore differences in formatting, naming, and comments. Judge only whether A and B accomplish the same thing for this task.

Respond with exactly one word: YES if they are equivalent, NO if they are not."#;

/// Queries the LLM for pairwise semantic equivalence. Stateless beyond the
/// `LlmClient` it wraps; one instance is shared across every comparison in
/// a run.
pub struct Discriminator {
    client: Arc<LlmClient>,
    model_id: String,
}

impl Discriminator {
    pub fn new(client: Arc<LlmClient>, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
        }
    }

    /// Ask whether `candidate_text` is equivalent to `representative_text`
    /// under `snapshot`. Any failure to get a clean `YES` is treated as
    /// `NO` (§4.2): an LLM error, a timeout that exhausts retries, or a
    /// response that isn't a `YES`/`NO` prefix all collapse to "keep these
    /// candidates in separate groups."
    pub async fn equivalent(
        &self,
        snapshot: &ContextSnapshot,
        representative_text: &str,
        candidate_text: &str,
    ) -> bool {
        let prompt = DISCRIMINATE_PROMPT
            .replace("{context}", &render_context(snapshot))
            .replace("{code_a}", representative_text)
            .replace("{code_b}", candidate_text);

        let request = ChatRequest::new(vec![Message::human(prompt)])
            .with_temperature(0.0)
            .with_model(self.model_id.clone());

        match self.query(request).await {
            Ok(response) => parse_yes_no(response.text()),
            Err(e) => {
                warn!("discriminator query failed, defaulting to NO: {e}");
                false
            }
        }
    }

    async fn query(&self, request: ChatRequest) -> Result<mdap_core::llm::ChatResponse> {
        self.client.complete(request).await
    }
}

fn render_context(snapshot: &ContextSnapshot) -> String {
    let ctx = snapshot.get();
    format!(
        "task: {}\nlanguage: {}\nrequirements: {}",
        ctx.task,
        ctx.language,
        ctx.requirements.join("; ")
    )
}

/// Case-insensitive prefix match on `YES`/`NO`; any other response is `NO`
/// (§4.2). This is the only place the discriminator's raw text is parsed.
fn parse_yes_no(text: &str) -> bool {
    let trimmed = text.trim().to_lowercase();
    if trimmed.starts_with("yes") {
        debug!("discriminator: YES");
        true
    } else {
        debug!("discriminator: NO (raw response: {text:?})");
        false
    }
}
