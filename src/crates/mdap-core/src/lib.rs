//! # mdap-core - data model and LLM client contract
//!
//! The shared vocabulary for an MDAP (Massively Decomposed Agentic
//! Processes) voting pipeline: `Step`, `Candidate`, `Group`, `VoteResult`,
//! `Context`/`ContextSnapshot`, `MDAPConfig`, `PipelineState`, and
//! `Decision` (see [`model`]), plus the [`llm`] module's `ChatModel`
//! trait — the thin boundary the voting engine uses to talk to whatever
//! serves completions.
//!
//! This crate holds no algorithms. The first-to-ahead-by-k vote, the
//! discriminator protocol, the red-flag filter, and the pipeline state
//! machine's transition logic live in `mdap-engine`, built on top of
//! these types.

pub mod error;
pub mod llm;
pub mod messages;
pub mod model;

pub use error::{CoreError, Result};
pub use messages::{Message, MessageRole};
pub use model::{
    Candidate, Context, ContextSnapshot, Decision, FunctionRecord, FunctionRecordData, Group,
    MDAPConfig, PipelineState, Step, StepType, TerminationReason, VoteResult,
};

/// Crate version, for CLI `status`/`version` output.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
