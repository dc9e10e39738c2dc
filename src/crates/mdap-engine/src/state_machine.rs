//! The pipeline's nine-state machine (§4.5).
//!
//! Grounded on `orchestrator/src/lib.rs`'s `Task::update_status` —
//! guarded transitions that reject moves out of a terminal status and
//! return a typed `InvalidStateTransition` error rather than panicking.
//! Here the guard table is richer (nine states, `Paused`/
//! `AwaitingDecision` each remembering a predecessor) but the shape is the
//! same: transitions are data, illegal ones are rejected and reported,
//! never silently dropped and never an uncatchable failure.

use mdap_core::PipelineState;

/// Events that drive the pipeline state machine (§4.5's transition table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    Start,
    ExpandDone,
    DecomposeDone,
    GenerateDoneAll,
    ValidateDone,
    Pause,
    Resume,
    Cancel,
    AwaitDecision,
    DecisionMade,
    Error,
}

impl PipelineEvent {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineEvent::Start => "start",
            PipelineEvent::ExpandDone => "expand_done",
            PipelineEvent::DecomposeDone => "decompose_done",
            PipelineEvent::GenerateDoneAll => "generate_done_all",
            PipelineEvent::ValidateDone => "validate_done",
            PipelineEvent::Pause => "pause",
            PipelineEvent::Resume => "resume",
            PipelineEvent::Cancel => "cancel",
            PipelineEvent::AwaitDecision => "await_decision",
            PipelineEvent::DecisionMade => "decision_made",
            PipelineEvent::Error => "error",
        }
    }
}

/// An event was rejected from the current state. Carries both sides so
/// the caller can log and report without re-deriving them.
#[derive(Debug, Clone, thiserror::Error)]
#[error("illegal transition: {event} is not valid from {from}")]
pub struct IllegalTransition {
    pub from: String,
    pub event: String,
}

/// Apply one event to a state, per the transition table in §4.5.
///
/// Pure function: no side effects, no logging. The caller (the
/// orchestrator) is responsible for recording both accepted and rejected
/// transitions to the `DecisionTracker`.
pub fn apply(state: &PipelineState, event: PipelineEvent) -> Result<PipelineState, IllegalTransition> {
    use PipelineState::*;

    let illegal = || IllegalTransition {
        from: state.label().to_string(),
        event: event.label().to_string(),
    };

    match event {
        PipelineEvent::Start => match state {
            Idle => Ok(Expanding),
            _ => Err(illegal()),
        },
        PipelineEvent::ExpandDone => match state {
            Expanding => Ok(Decomposing),
            _ => Err(illegal()),
        },
        PipelineEvent::DecomposeDone => match state {
            Decomposing => Ok(Generating),
            _ => Err(illegal()),
        },
        PipelineEvent::GenerateDoneAll => match state {
            Generating => Ok(Validating),
            _ => Err(illegal()),
        },
        PipelineEvent::ValidateDone => match state {
            Validating => Ok(Completed),
            _ => Err(illegal()),
        },
        PipelineEvent::Pause => {
            if state.is_active_phase() {
                Ok(Paused(Box::new(state.clone())))
            } else {
                Err(illegal())
            }
        }
        PipelineEvent::Resume => match state {
            Paused(prev) => Ok((**prev).clone()),
            _ => Err(illegal()),
        },
        PipelineEvent::Cancel => {
            if state.is_terminal() {
                Err(illegal())
            } else {
                Ok(Idle)
            }
        }
        PipelineEvent::AwaitDecision => {
            if state.is_active_phase() {
                Ok(AwaitingDecision(Box::new(state.clone())))
            } else {
                Err(illegal())
            }
        }
        PipelineEvent::DecisionMade => match state {
            AwaitingDecision(prev) => Ok((**prev).clone()),
            _ => Err(illegal()),
        },
        PipelineEvent::Error => {
            if state.is_terminal() {
                Err(illegal())
            } else {
                Ok(Error)
            }
        }
    }
}
