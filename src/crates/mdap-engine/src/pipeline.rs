//! The pipeline orchestrator: ties the state machine, the four phase
//! executors, the decision tracker, the resource manager, and the
//! interrupt handler into the single object a CLI or service drives.
//!
//! Grounded on `orchestrator/src/lib.rs`'s `Orchestrator` — the struct
//! that owns a `Task` and walks it through its lifecycle, calling out to
//! an executor per step and recording status transitions. Here the "task"
//! is the whole MDAP run, and the "steps" are the four voting phases.

use std::collections::HashMap;
use std::sync::Arc;

use mdap_core::{Context, FunctionRecord, FunctionRecordData, MDAPConfig, PipelineState, Step, StepType, VoteResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::decision_tracker::{DecisionTracker, TrackedEntry};
use crate::discriminator::Discriminator;
use crate::error::{EngineError, Result};
use crate::interrupt::InterruptHandler;
use crate::llm_client::LlmClient;
use crate::phases::{decompose, expand, generate, validate, DecomposeGenerator, ExpandGenerator, GenerateGenerator, ValidateGenerator};
use crate::resource::{PricingTable, ResourceBudgets, ResourceManager};
use crate::state_machine::{self, PipelineEvent};
use crate::voter::VoterContext;

/// The document written at `COMPLETED` (§6). Field names and nesting are
/// part of the external contract; do not rename without updating
/// downstream tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedResult {
    pub task: String,
    pub config: MDAPConfig,
    pub requirements: Vec<String>,
    pub functions: Vec<FunctionRecordData>,
    pub code: HashMap<String, String>,
    pub metrics: RunMetrics,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RunMetrics {
    pub iterations: usize,
    pub api_calls: u64,
    pub total_time: f64,
    pub tokens: u64,
    pub cost_usd: f64,
}

/// Owns one MDAP run end to end. Not `Clone`: the pipeline is the single
/// mutable owner of `Context`; every other collaborator (resources,
/// tracker, interrupt handler) is shared by reference or `Arc` instead.
pub struct Pipeline {
    state: PipelineState,
    context: Option<Context>,
    cfg: MDAPConfig,
    tracker: DecisionTracker,
    resources: ResourceManager,
    interrupt: InterruptHandler,
    discriminator: Discriminator,
    expand_gen: ExpandGenerator,
    decompose_gen: DecomposeGenerator,
    generate_gen: GenerateGenerator,
    validate_gen: ValidateGenerator,
    iterations: usize,
}

impl Pipeline {
    pub fn new(cfg: MDAPConfig, client: Arc<LlmClient>, budgets: ResourceBudgets, pricing: PricingTable) -> Self {
        let model_id = cfg.model_id.clone();
        let temperature = cfg.temperature;
        Self {
            state: PipelineState::Idle,
            context: None,
            tracker: DecisionTracker::new(),
            resources: ResourceManager::new(budgets, pricing),
            interrupt: InterruptHandler::new(),
            discriminator: Discriminator::new(client.clone(), model_id.clone()),
            expand_gen: ExpandGenerator::new(client.clone(), model_id.clone(), temperature),
            decompose_gen: DecomposeGenerator::new(client.clone(), model_id.clone(), temperature),
            generate_gen: GenerateGenerator::new(client.clone(), model_id.clone(), temperature),
            validate_gen: ValidateGenerator::new(client, model_id, temperature),
            cfg,
            iterations: 0,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn config(&self) -> &MDAPConfig {
        &self.cfg
    }

    pub fn interrupt_handler(&self) -> &InterruptHandler {
        &self.interrupt
    }

    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn history(&self, n: usize) -> Vec<TrackedEntry> {
        self.tracker.last_n(n)
    }

    fn transition(&mut self, event: PipelineEvent) -> Result<()> {
        match state_machine::apply(&self.state, event) {
            Ok(next) => {
                self.tracker
                    .record_transition(self.state.label(), event.label(), Some(next.label().to_string()), true);
                self.state = next;
                Ok(())
            }
            Err(e) => {
                self.tracker.record_transition(self.state.label(), event.label(), None, false);
                Err(EngineError::IllegalTransition {
                    from: e.from,
                    event: e.event,
                })
            }
        }
    }

    pub fn pause(&mut self) -> Result<()> {
        self.interrupt.pause();
        self.transition(PipelineEvent::Pause)
    }

    pub fn resume(&mut self) -> Result<()> {
        self.interrupt.resume();
        self.transition(PipelineEvent::Resume)
    }

    /// Cancel is best-effort from a terminal state: the interrupt flag is
    /// still raised (harmless) but an already-terminal pipeline simply
    /// stays there rather than surfacing an error nobody asked to see.
    pub fn cancel(&mut self) {
        self.interrupt.cancel();
        if let Err(e) = self.transition(PipelineEvent::Cancel) {
            debug!("cancel from a terminal state was a no-op: {e}");
        }
    }

    /// Drive a complete run: EXPAND -> DECOMPOSE -> GENERATE (+ nested
    /// sub-functions) -> VALIDATE -> COMPLETED. Returns the persisted
    /// result document on success.
    pub async fn run(&mut self, task: impl Into<String>, language: impl Into<String>) -> Result<PersistedResult> {
        self.context = Some(Context::new(task, language));
        self.transition(PipelineEvent::Start)?;

        self.run_expand().await?;
        self.transition(PipelineEvent::ExpandDone)?;

        let planned = self.run_decompose().await?;
        self.transition(PipelineEvent::DecomposeDone)?;

        self.run_generate_all(planned).await?;
        self.transition(PipelineEvent::GenerateDoneAll)?;

        let outcome = self.run_validate().await?;
        self.transition(PipelineEvent::ValidateDone)?;

        if !outcome.valid {
            warn!("run completed with a failing validation: {:?}", outcome.errors);
        }

        Ok(self.persisted_result())
    }

    /// Run only the EXPAND phase, for the CLI's `expand` command, which
    /// previews requirements without committing the process to the full
    /// EXPAND -> DECOMPOSE -> GENERATE -> VALIDATE run. Leaves the pipeline
    /// in `EXPANDING` rather than driving it to a terminal state.
    pub async fn expand_only(&mut self, task: impl Into<String>, language: impl Into<String>) -> Result<Vec<String>> {
        self.context = Some(Context::new(task, language));
        self.transition(PipelineEvent::Start)?;
        self.run_expand().await?;
        Ok(self.context().requirements.clone())
    }

    fn voter_context(&self) -> VoterContext<'_> {
        VoterContext {
            discriminator: &self.discriminator,
            resources: &self.resources,
            interrupt: &self.interrupt,
        }
    }

    fn context_mut(&mut self) -> &mut Context {
        self.context.as_mut().expect("run() always initializes context before any phase executes")
    }

    fn context(&self) -> &Context {
        self.context.as_ref().expect("run() always initializes context before any phase executes")
    }

    /// Interpret one phase's `VoteResult`: record it, translate a
    /// termination other than `AheadByK`/`MaxSamples` into the matching
    /// pipeline transition and error (§4.7: a budget breach moves the
    /// pipeline to `ERROR`; a user cancellation is handled by the caller
    /// of `cancel()`, which already drove the transition to `IDLE`).
    fn record_and_check(&mut self, phase: StepType, result: VoteResult) -> Result<VoteResult> {
        let cost_estimate = self.resources.metrics().estimated_cost_usd;
        self.tracker.record_vote(phase, &result, cost_estimate);
        self.iterations += 1;

        match result.terminated_by {
            mdap_core::TerminationReason::AheadByK | mdap_core::TerminationReason::MaxSamples => Ok(result),
            mdap_core::TerminationReason::Cancelled => {
                let _ = self.transition(PipelineEvent::Cancel);
                Err(EngineError::Custom(format!("{phase} vote was cancelled")))
            }
            mdap_core::TerminationReason::BudgetExhausted => {
                let reason = format!("{phase} vote exhausted its budget after {} samples", result.total_samples);
                let _ = self.transition(PipelineEvent::Error);
                Err(EngineError::BudgetExhausted(reason))
            }
        }
    }

    async fn run_expand(&mut self) -> Result<()> {
        let snapshot = self.context().snapshot();
        let step = Step::new(StepType::Expand, "expand task into requirements");
        let vctx = self.voter_context();
        let result = crate::voter::vote(&step, &snapshot, &self.expand_gen, &self.cfg, &vctx, None).await;
        let result = self.record_and_check(StepType::Expand, result)?;

        let winner = result.winner.expect("AheadByK/MaxSamples always carry a winner");
        for requirement in expand::parse_requirements(&winner.raw_text) {
            self.context_mut().append_requirement(requirement);
        }
        info!(count = self.context().requirements.len(), "expand phase complete");
        Ok(())
    }

    async fn run_decompose(&mut self) -> Result<Vec<FunctionRecord>> {
        let snapshot = self.context().snapshot();
        let step = Step::new(StepType::Decompose, "decompose requirements into functions");
        let vctx = self.voter_context();
        let extra_check: crate::voter::ExtraCheck = &decompose::check_topological_order;
        let result = crate::voter::vote(&step, &snapshot, &self.decompose_gen, &self.cfg, &vctx, Some(extra_check)).await;
        let result = self.record_and_check(StepType::Decompose, result)?;

        let winner = result.winner.expect("AheadByK/MaxSamples always carry a winner");
        let planned = decompose::parse_function_records(&winner.raw_text).unwrap_or_default();
        info!(count = planned.len(), "decompose phase complete");
        Ok(planned)
    }

    async fn run_generate_all(&mut self, planned: Vec<FunctionRecord>) -> Result<()> {
        for record in planned {
            if self.context().functions.iter().any(|f| f.signature == record.signature) {
                continue; // already synthesized as a nested dependency of an earlier function
            }

            // Built from disjoint fields (not through `self.voter_context()`/
            // `self.context_mut()`) so the compiler can see this immutable
            // borrow of discriminator/resources/interrupt and the mutable
            // borrow of `self.context` below don't alias.
            let vctx = VoterContext {
                discriminator: &self.discriminator,
                resources: &self.resources,
                interrupt: &self.interrupt,
            };
            let mut frontier = std::collections::HashSet::new();
            let context = self.context.as_mut().expect("run() always initializes context before any phase executes");
            let result =
                generate::generate_with_nested_pass(&record, context, &self.generate_gen, &self.cfg, &vctx, &mut frontier).await;
            self.record_and_check(StepType::Generate, result)?;
        }
        info!("generate phase complete");
        Ok(())
    }

    async fn run_validate(&mut self) -> Result<validate::ValidationOutcome> {
        let code = self
            .context()
            .code
            .values()
            .cloned()
            .collect::<Vec<_>>()
            .join("\n\n");
        let snapshot = self.context().snapshot();
        let step = Step::new(StepType::Validate, "validate generated code")
            .with_target(code)
            .with_specification(self.context().task.clone());
        let vctx = self.voter_context();
        let result = crate::voter::vote(&step, &snapshot, &self.validate_gen, &self.cfg, &vctx, None).await;
        let result = self.record_and_check(StepType::Validate, result)?;

        let winner = result.winner.expect("AheadByK/MaxSamples always carry a winner");
        Ok(validate::parse_validation_outcome(&winner.raw_text))
    }

    fn persisted_result(&self) -> PersistedResult {
        let metrics = self.resources.metrics();
        let ctx = self.context();
        PersistedResult {
            task: ctx.task.clone(),
            config: self.cfg.clone(),
            requirements: ctx.requirements.clone(),
            functions: ctx.functions.clone(),
            code: ctx.code.clone(),
            metrics: RunMetrics {
                iterations: self.iterations,
                api_calls: metrics.api_calls,
                total_time: metrics.elapsed_seconds,
                tokens: metrics.total_tokens(),
                cost_usd: metrics.estimated_cost_usd,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mdap_core::llm::{ChatModel, ChatRequest, ChatResponse};
    use mdap_core::Message;

    /// Returns a fixed response per call count: expand -> one requirement,
    /// decompose -> one function record, generate -> a trivial body with
    /// no external calls, validate -> a passing verdict. The discriminator
    /// query always lands on "NO" (different prompt shape), which is fine
    /// since every phase here only needs one sample to reach AheadByK with
    /// `k = 1`.
    struct ScriptedPipelineModel;

    #[async_trait]
    impl ChatModel for ScriptedPipelineModel {
        async fn chat(&self, request: ChatRequest) -> mdap_core::error::Result<ChatResponse> {
            let prompt = request.messages[0].text();
            let text = if prompt.contains("Respond with exactly one word: YES") {
                "NO".to_string()
            } else if prompt.contains("atomic, testable requirements") {
                r#"["supports addition"]"#.to_string()
            } else if prompt.contains("function records") {
                r#"[{"signature": "fn add(a, b)", "description": "adds two numbers", "dependencies": [], "requirement_ids": [0]}]"#
                    .to_string()
            } else if prompt.contains("Write the implementation") {
                "fn add(a: i32, b: i32) -> i32 { a + b }".to_string()
            } else {
                r#"{"valid": true, "errors": [], "warnings": []}"#.to_string()
            };
            Ok(ChatResponse {
                message: Message::ai(text),
                usage: None,
            })
        }

        fn clone_box(&self) -> Box<dyn ChatModel> {
            Box::new(ScriptedPipelineModel)
        }
    }

    fn test_pipeline() -> Pipeline {
        let client = Arc::new(LlmClient::new(Box::new(ScriptedPipelineModel), Default::default()));
        let cfg = MDAPConfig::default().with_k(1).with_max_samples(3);
        Pipeline::new(cfg, client, ResourceBudgets::default(), PricingTable::default())
    }

    #[tokio::test]
    async fn test_full_run_reaches_completed() {
        let mut pipeline = test_pipeline();
        let result = pipeline.run("build a calculator", "rust").await.unwrap();

        assert_eq!(*pipeline.state(), PipelineState::Completed);
        assert_eq!(result.requirements, vec!["supports addition".to_string()]);
        assert_eq!(result.functions.len(), 1);
        assert!(result.code.contains_key("fn add(a, b)"));
    }

    #[tokio::test]
    async fn test_pause_then_resume_returns_to_generating() {
        let mut pipeline = test_pipeline();
        pipeline.context = Some(Context::new("t", "rust"));
        pipeline.transition(PipelineEvent::Start).unwrap();
        pipeline.transition(PipelineEvent::ExpandDone).unwrap();
        pipeline.transition(PipelineEvent::DecomposeDone).unwrap();
        assert_eq!(*pipeline.state(), PipelineState::Generating);

        pipeline.pause().unwrap();
        assert!(pipeline.interrupt_handler().is_paused());
        pipeline.resume().unwrap();
        assert_eq!(*pipeline.state(), PipelineState::Generating);
        assert!(!pipeline.interrupt_handler().is_paused());
    }

    #[tokio::test]
    async fn test_cancel_from_idle_is_a_no_op_not_a_panic() {
        let mut pipeline = test_pipeline();
        pipeline.cancel();
        assert_eq!(*pipeline.state(), PipelineState::Idle);
    }

    #[tokio::test]
    async fn test_history_records_transitions_and_votes() {
        let mut pipeline = test_pipeline();
        let _ = pipeline.run("build a calculator", "rust").await.unwrap();
        let entries = pipeline.history(100);
        assert!(entries.iter().any(|e| matches!(e, TrackedEntry::Vote(_))));
        assert!(entries.iter().any(|e| matches!(e, TrackedEntry::Transition { .. })));
    }
}
