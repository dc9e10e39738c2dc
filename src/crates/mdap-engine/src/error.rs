//! Errors surfaced by the voting engine and pipeline orchestrator.
//!
//! Per the core boundary contract, nothing below escapes as a panic or an
//! out-of-band exception: the voter, phase executors, and pipeline each
//! return a `Result` whose `Err` carries enough structure for a caller to
//! decide whether the failure is recoverable.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The state machine rejected an event from the current state. Still
    /// surfaced to the caller (never silently swallowed), but does not
    /// panic — illegal transitions are an expected occurrence, not a bug.
    #[error("illegal transition: {event} is not valid from {from}")]
    IllegalTransition { from: String, event: String },

    /// A resource budget (tokens, cost, or wall-clock time) was breached.
    #[error("budget exhausted: {0}")]
    BudgetExhausted(String),

    /// Propagated from `mdap_core`'s LLM client contract.
    #[error(transparent)]
    Core(#[from] mdap_core::error::CoreError),

    /// Application-defined error not covered above (e.g. a malformed
    /// phase-executor response that could not be parsed at all).
    #[error("{0}")]
    Custom(String),
}

impl EngineError {
    /// Whether the orchestrator can reasonably continue after this error,
    /// surfaced on the user-visible structured failure object (§7).
    pub fn recoverable(&self) -> bool {
        match self {
            EngineError::IllegalTransition { .. } => true,
            EngineError::BudgetExhausted(_) => false,
            EngineError::Core(_) => true,
            EngineError::Custom(_) => true,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::IllegalTransition { .. } => "state_machine_violation",
            EngineError::BudgetExhausted(_) => "budget_exhaustion",
            EngineError::Core(_) => "transport",
            EngineError::Custom(_) => "custom",
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// The single structured failure object surfaced across the core boundary
/// (§7): `kind`, `message`, `recoverable`, and the `VoteResult` that
/// produced it, if any.
#[derive(Debug)]
pub struct StructuredFailure {
    pub kind: &'static str,
    pub message: String,
    pub recoverable: bool,
    pub vote_result: Option<mdap_core::VoteResult>,
}

impl StructuredFailure {
    pub fn from_error(error: &EngineError, vote_result: Option<mdap_core::VoteResult>) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
            recoverable: error.recoverable(),
            vote_result,
        }
    }
}
