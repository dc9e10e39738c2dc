//! Error types for the `mdap` CLI.

use thiserror::Error;

/// Result type alias for `mdap-cli` operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Unified error type surfaced by the CLI binary. Wraps the lower crates'
/// errors rather than re-deriving their variants, per §7's "single
/// structured failure object" stance carried up to the process boundary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Engine(#[from] mdap_engine::EngineError),

    #[error("{0}")]
    Llm(#[from] mdap_llm::LlmError),

    #[error("no run record found at {0}")]
    NoRunRecord(String),

    #[error("budget '{0}' is not one of tokens, cost, time")]
    UnknownBudgetKind(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<String> for CliError {
    fn from(msg: String) -> Self {
        Self::Other(msg)
    }
}

impl From<&str> for CliError {
    fn from(msg: &str) -> Self {
        Self::Other(msg.to_string())
    }
}

/// Process exit codes, per §6: `0` COMPLETED, `1` ERROR, `2` cancelled by
/// user, `3` budget exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Completed,
    Error,
    Cancelled,
    BudgetExhausted,
}

impl ExitOutcome {
    pub fn code(self) -> i32 {
        match self {
            ExitOutcome::Completed => 0,
            ExitOutcome::Error => 1,
            ExitOutcome::Cancelled => 2,
            ExitOutcome::BudgetExhausted => 3,
        }
    }

    /// Classify a pipeline-run failure into the matching exit code. A
    /// cancellation is recognized by message text because `EngineError`
    /// does not carry a dedicated `Cancelled` variant (cancellation is
    /// surfaced as a `Custom` message from `Pipeline::record_and_check`).
    pub fn from_engine_error(err: &mdap_engine::EngineError) -> Self {
        match err {
            mdap_engine::EngineError::BudgetExhausted(_) => ExitOutcome::BudgetExhausted,
            mdap_engine::EngineError::Custom(msg) if msg.contains("cancelled") => ExitOutcome::Cancelled,
            _ => ExitOutcome::Error,
        }
    }
}
