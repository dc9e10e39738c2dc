//! Ambient-stack helpers shared by `mdap-cli`: retry/timeout wrappers for
//! async operations, a `ConfigBuilder` trait plus environment-variable
//! loading for the CLI's configuration layer, structured-logging helpers
//! built on `tracing`, and error-context formatting.
//!
//! # Modules
//!
//! - `config` - `ConfigBuilder` trait and environment variable loading
//! - `error` - error context and error-chain formatting
//! - `async_utils` - retry policies and timeout utilities for async operations
//! - `logging` - structured logging helpers and formatters

pub mod async_utils;
pub mod config;
pub mod error;
pub mod logging;

use thiserror::Error;

/// Errors that can occur in the tooling crate.
#[derive(Debug, Error)]
pub enum ToolingError {
    /// General error with message
    #[error("Tooling error: {0}")]
    General(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for tooling operations.
pub type Result<T> = std::result::Result<T, ToolingError>;

/// Crate version, for CLI `status`/`version` output.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let v = version();
        assert!(!v.is_empty());
    }
}
