//! The MDAP data model: steps, candidates, groups, votes, context, config,
//! pipeline state, and decisions.
//!
//! These types are pure data plus the small amount of state-guarded
//! mutation logic their invariants require (e.g. a [`Context`] only grows
//! through explicit append methods; a [`PipelineState`] only transitions
//! through [`PipelineState::apply`]). The algorithms that drive them
//! (voting, phase execution, the pipeline loop) live in `mdap-engine`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::llm::UsageMetadata;

/// The kind of work a [`Step`] performs.
///
/// `Expand`, `Decompose`, `Generate`, and `Validate` are the four phases
/// driven by the voting engine. The remaining variants describe step
/// kinds an orchestrator built on top of this core may schedule (deciding
/// between options, reading/searching the workspace, running tests,
/// applying a patch, or marking a run done); the core treats them as
/// opaque labels, since filesystem tools and test runners are external
/// collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepType {
    Expand,
    Decompose,
    Generate,
    Validate,
    Decide,
    Read,
    Search,
    Test,
    Apply,
    Done,
}

impl std::fmt::Display for StepType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One unit of work. Created by the orchestrator and immutable thereafter;
/// build the description/target/specification via the `with_*` methods
/// before the step starts executing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: Uuid,
    pub step_type: StepType,
    pub description: String,
    pub target: Option<String>,
    pub specification: String,
}

impl Step {
    pub fn new(step_type: StepType, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            step_type,
            description: description.into(),
            target: None,
            specification: String::new(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_specification(mut self, specification: impl Into<String>) -> Self {
        self.specification = specification.into();
        self
    }
}

/// One LLM sample produced for a [`Step`].
///
/// Group membership is assigned exactly once, by the Voter, after the
/// candidate survives the red-flag filter and is compared against
/// existing group representatives. `red_flag_reason` and `group_id` are
/// mutually exclusive in practice: a rejected candidate never reaches
/// grouping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    pub raw_text: String,
    pub normalized_text: String,
    pub group_id: Option<usize>,
    pub red_flag_reason: Option<String>,
    pub token_usage: Option<UsageMetadata>,
}

impl Candidate {
    /// Construct a candidate from a raw LLM sample. `normalized_text` is
    /// the whitespace-trimmed, lowercased form used for duplicate
    /// detection by phase executors (e.g. requirement de-duplication);
    /// the Discriminator always compares `raw_text`.
    pub fn new(raw_text: impl Into<String>, token_usage: Option<UsageMetadata>) -> Self {
        let raw_text = raw_text.into();
        let normalized_text = raw_text.trim().to_lowercase();
        Self {
            id: Uuid::new_v4(),
            raw_text,
            normalized_text,
            group_id: None,
            red_flag_reason: None,
            token_usage,
        }
    }

    pub fn red_flagged(raw_text: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut candidate = Self::new(raw_text, None);
        candidate.red_flag_reason = Some(reason.into());
        candidate
    }

    pub fn is_red_flagged(&self) -> bool {
        self.red_flag_reason.is_some()
    }

    /// Assign this candidate to a group. Invariant: called at most once
    /// per candidate, by the Voter, immediately after grouping.
    pub fn assign_group(&mut self, group_id: usize) {
        debug_assert!(
            self.group_id.is_none(),
            "candidate group membership assigned twice"
        );
        self.group_id = Some(group_id);
    }
}

/// A set of candidates judged semantically equivalent by the
/// Discriminator. `representative` is the first candidate placed in the
/// group; later members never replace it, so repeated comparisons against
/// this group always target the same text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: usize,
    pub representative: Candidate,
    pub members: Vec<Candidate>,
}

impl Group {
    pub fn new(id: usize, representative: Candidate) -> Self {
        Self {
            id,
            members: vec![representative.clone()],
            representative,
        }
    }

    pub fn push(&mut self, candidate: Candidate) {
        self.members.push(candidate);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Why a vote stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    /// The leading group's margin over the runner-up reached `k`.
    AheadByK,
    /// `max_samples` was reached without any group reaching margin `k`;
    /// the largest group wins, ties broken by earliest group id.
    MaxSamples,
    /// The pipeline was cancelled mid-vote.
    Cancelled,
    /// A resource budget was breached mid-vote.
    BudgetExhausted,
}

/// The outcome of one call to `vote()`.
///
/// `winner` is `None` whenever the vote never accepted a single sample —
/// either the rejection budget (`3 * max_samples`) was exhausted before any
/// candidate survived the red-flag filter, a resource budget was breached
/// before the first acceptance, or the vote was cancelled. `AheadByK` and
/// `MaxSamples` always carry a winner, since reaching either requires at
/// least one accepted candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResult {
    pub winner: Option<Candidate>,
    pub total_samples: usize,
    pub groups: HashMap<usize, Group>,
    pub votes_per_group: HashMap<usize, usize>,
    pub winning_margin: i64,
    pub terminated_by: TerminationReason,
    pub rejections: usize,
}

/// One function record produced by the Decompose phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub signature: String,
    pub description: String,
    pub dependencies: Vec<String>,
    pub requirement_ids: Vec<usize>,
}

/// The mutable accumulator for one pipeline run.
///
/// Only the orchestrator mutates a `Context`, and only through the
/// explicit methods below — there is no general-purpose setter. Every
/// vote instead reads an immutable [`ContextSnapshot`] taken at the start
/// of that vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub task: String,
    pub language: String,
    pub requirements: Vec<String>,
    pub functions: Vec<FunctionRecordData>,
    pub code: HashMap<String, String>,
    pub history: Vec<StepRecord>,
    pub depth: usize,
}

/// Serializable twin of [`FunctionRecord`] kept on `Context` (derives
/// `PartialEq` so snapshot bit-equality is checkable in tests;
/// `FunctionRecord` itself need not be comparable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionRecordData {
    pub signature: String,
    pub description: String,
    pub dependencies: Vec<String>,
    pub requirement_ids: Vec<usize>,
}

impl From<FunctionRecord> for FunctionRecordData {
    fn from(f: FunctionRecord) -> Self {
        Self {
            signature: f.signature,
            description: f.description,
            dependencies: f.dependencies,
            requirement_ids: f.requirement_ids,
        }
    }
}

/// A step executed in this run, recorded for history/debugging. Kept
/// lighter than `Step` itself: only what's needed to reconstruct what
/// happened, comparable for snapshot equality tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step_type: StepType,
    pub description: String,
}

impl Context {
    pub fn new(task: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            language: language.into(),
            requirements: Vec::new(),
            functions: Vec::new(),
            code: HashMap::new(),
            history: Vec::new(),
            depth: 0,
        }
    }

    /// Append a requirement if not already present (order-preserving,
    /// duplicate-free per §3).
    pub fn append_requirement(&mut self, requirement: impl Into<String>) {
        let requirement = requirement.into();
        if !self.requirements.contains(&requirement) {
            self.requirements.push(requirement);
        }
    }

    pub fn append_function(&mut self, function: FunctionRecord) {
        self.functions.push(function.into());
    }

    pub fn set_code(&mut self, signature: impl Into<String>, code: impl Into<String>) {
        self.code.insert(signature.into(), code.into());
    }

    pub fn push_history(&mut self, step: &Step) {
        self.history.push(StepRecord {
            step_type: step.step_type,
            description: step.description.clone(),
        });
    }

    pub fn increment_depth(&mut self) {
        self.depth += 1;
    }

    pub fn decrement_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Take an immutable, deep-copied snapshot. Every candidate and every
    /// discriminator query within one vote must be built from the same
    /// snapshot instance so they observe identical inputs.
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot(self.clone())
    }
}

/// An immutable, deep-copied view of [`Context`] taken at the start of a
/// vote. Holds no reference into live state: it is a value, not a
/// borrow, so concurrent mutation of the live `Context` (which never
/// happens mid-vote, but the type does not rely on that) cannot be
/// observed through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot(Context);

impl ContextSnapshot {
    pub fn get(&self) -> &Context {
        &self.0
    }
}

impl std::ops::Deref for ContextSnapshot {
    type Target = Context;
    fn deref(&self) -> &Context {
        &self.0
    }
}

/// Tunable parameters for the voting engine and pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MDAPConfig {
    pub k: usize,
    pub max_samples: usize,
    pub max_tokens_response: usize,
    pub temperature: f32,
    pub model_id: String,
    pub max_depth: usize,
}

impl Default for MDAPConfig {
    fn default() -> Self {
        Self {
            k: 3,
            max_samples: 20,
            max_tokens_response: 500,
            temperature: 0.1,
            model_id: "default".to_string(),
            max_depth: 3,
        }
    }
}

impl MDAPConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    pub fn with_max_tokens_response(mut self, max_tokens_response: usize) -> Self {
        self.max_tokens_response = max_tokens_response;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Rejection budget before a vote gives up entirely: `3 * max_samples`.
    pub fn max_rejections(&self) -> usize {
        3 * self.max_samples
    }
}

/// The pipeline's nine-state machine. `Paused` and `AwaitingDecision`
/// carry their predecessor so `resume`/`decision_made` can return to it
/// without external bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Idle,
    Expanding,
    Decomposing,
    Generating,
    Validating,
    Paused(Box<PipelineState>),
    AwaitingDecision(Box<PipelineState>),
    Completed,
    Error,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Completed | PipelineState::Error)
    }

    pub fn is_active_phase(&self) -> bool {
        matches!(
            self,
            PipelineState::Expanding
                | PipelineState::Decomposing
                | PipelineState::Generating
                | PipelineState::Validating
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "IDLE",
            PipelineState::Expanding => "EXPANDING",
            PipelineState::Decomposing => "DECOMPOSING",
            PipelineState::Generating => "GENERATING",
            PipelineState::Validating => "VALIDATING",
            PipelineState::Paused(_) => "PAUSED",
            PipelineState::AwaitingDecision(_) => "AWAITING_DECISION",
            PipelineState::Completed => "COMPLETED",
            PipelineState::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One append-only record of a vote or state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub timestamp: DateTime<Utc>,
    pub phase: StepType,
    pub rationale: String,
    pub winning_margin: i64,
    pub samples_used: usize,
    pub rejections: usize,
    pub tokens: u64,
    pub cost_estimate: f64,
}

impl Decision {
    pub fn from_vote(phase: StepType, result: &VoteResult, cost_estimate: f64) -> Self {
        let tokens = result
            .groups
            .values()
            .flat_map(|g| g.members.iter())
            .filter_map(|c| c.token_usage.as_ref())
            .map(|u| u.total())
            .sum();

        Self {
            timestamp: Utc::now(),
            phase,
            rationale: format!("{:?}", result.terminated_by),
            winning_margin: result.winning_margin,
            samples_used: result.total_samples,
            rejections: result.rejections,
            tokens,
            cost_estimate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_builder() {
        let step = Step::new(StepType::Generate, "generate add()")
            .with_target("fn add(a: i32, b: i32) -> i32")
            .with_specification("returns the sum");

        assert_eq!(step.step_type, StepType::Generate);
        assert_eq!(step.target.as_deref(), Some("fn add(a: i32, b: i32) -> i32"));
    }

    #[test]
    fn test_candidate_group_assignment() {
        let mut candidate = Candidate::new("fn add(a, b) { a + b }", None);
        assert!(candidate.group_id.is_none());
        candidate.assign_group(0);
        assert_eq!(candidate.group_id, Some(0));
    }

    #[test]
    fn test_red_flagged_candidate() {
        let candidate = Candidate::red_flagged("", "empty response");
        assert!(candidate.is_red_flagged());
        assert!(candidate.group_id.is_none());
    }

    #[test]
    fn test_group_push_and_len() {
        let rep = Candidate::new("a", None);
        let mut group = Group::new(0, rep);
        assert_eq!(group.len(), 1);
        group.push(Candidate::new("a again", None));
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn test_context_requirements_deduplicate() {
        let mut ctx = Context::new("build a thing", "rust");
        ctx.append_requirement("must be fast");
        ctx.append_requirement("must be fast");
        ctx.append_requirement("must be correct");

        assert_eq!(ctx.requirements.len(), 2);
    }

    #[test]
    fn test_snapshot_is_bit_equal_deep_copy() {
        let mut ctx = Context::new("task", "rust");
        ctx.append_requirement("r1");

        let snap1 = ctx.snapshot();
        let snap2 = ctx.snapshot();
        assert_eq!(snap1, snap2);

        // Mutating the live context must not affect a snapshot already taken.
        ctx.append_requirement("r2");
        assert_eq!(snap1.requirements.len(), 1);
        assert_eq!(ctx.requirements.len(), 2);
    }

    #[test]
    fn test_context_depth_tracking() {
        let mut ctx = Context::new("task", "rust");
        ctx.increment_depth();
        ctx.increment_depth();
        assert_eq!(ctx.depth, 2);
        ctx.decrement_depth();
        assert_eq!(ctx.depth, 1);
    }

    #[test]
    fn test_mdap_config_defaults() {
        let config = MDAPConfig::default();
        assert_eq!(config.k, 3);
        assert_eq!(config.max_samples, 20);
        assert_eq!(config.max_rejections(), 60);
    }

    #[test]
    fn test_mdap_config_builder_clamps_temperature() {
        let config = MDAPConfig::new().with_temperature(5.0);
        assert_eq!(config.temperature, 2.0);
    }

    #[test]
    fn test_pipeline_state_paused_remembers_predecessor() {
        let state = PipelineState::Paused(Box::new(PipelineState::Generating));
        assert_eq!(state.label(), "PAUSED");
        if let PipelineState::Paused(prev) = &state {
            assert_eq!(**prev, PipelineState::Generating);
        } else {
            panic!("expected Paused");
        }
    }

    #[test]
    fn test_pipeline_state_terminal() {
        assert!(PipelineState::Completed.is_terminal());
        assert!(PipelineState::Error.is_terminal());
        assert!(!PipelineState::Idle.is_terminal());
    }

    #[test]
    fn test_decision_from_vote() {
        let rep = Candidate::new("winner", None);
        let mut groups = HashMap::new();
        groups.insert(0, Group::new(0, rep.clone()));
        let mut votes_per_group = HashMap::new();
        votes_per_group.insert(0, 2);

        let result = VoteResult {
            winner: Some(rep),
            total_samples: 2,
            groups,
            votes_per_group,
            winning_margin: 2,
            terminated_by: TerminationReason::AheadByK,
            rejections: 3,
        };

        let decision = Decision::from_vote(StepType::Expand, &result, 0.001);
        assert_eq!(decision.winning_margin, 2);
        assert_eq!(decision.samples_used, 2);
        assert_eq!(decision.rejections, 3);
    }
}
