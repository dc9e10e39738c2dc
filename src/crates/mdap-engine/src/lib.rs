//! # mdap-engine - the MDAP voting engine and pipeline orchestrator
//!
//! Built on `mdap-core`'s data model: the red-flag filter (§4.1), the
//! discriminator (§4.2), the first-to-ahead-by-k vote (§4.3), the four
//! phase executors (§4.4), the nine-state pipeline (§4.5), the decision
//! tracker (§4.6), the resource manager (§4.7), and the interrupt handler
//! (§4.8), composed by [`pipeline::Pipeline`] into one runnable object.

pub mod decision_tracker;
pub mod discriminator;
pub mod error;
pub mod interrupt;
pub mod llm_client;
pub mod phases;
pub mod pipeline;
pub mod red_flag;
pub mod resource;
pub mod state_machine;
pub mod voter;

pub use decision_tracker::{DecisionTracker, TrackedEntry};
pub use discriminator::Discriminator;
pub use error::{EngineError, Result, StructuredFailure};
pub use interrupt::InterruptHandler;
pub use llm_client::{classify_error, ErrorClass, LlmClient, LlmClientConfig};
pub use phases::{DecomposeGenerator, ExpandGenerator, GenerateGenerator, ValidateGenerator};
pub use pipeline::{Pipeline, PersistedResult, RunMetrics};
pub use resource::{ModelPricing, PricingTable, ResourceBudgets, ResourceManager, ResourceMetrics};
pub use state_machine::{IllegalTransition, PipelineEvent};
pub use voter::{CandidateGenerator, ExtraCheck, GeneratedSample, VoterContext};

/// Crate version, for CLI `status`/`version` output.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
