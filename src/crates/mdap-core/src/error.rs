//! Error types shared by the MDAP crates.
//!
//! # Error Hierarchy
//!
//! ```text
//! CoreError
//! ├── Transport       - LLM client unreachable / malformed response
//! ├── Timeout         - a single LLM call exceeded its deadline
//! ├── RateLimited     - provider pushed back
//! ├── Validation      - request or response failed a shape check
//! ├── Serialization   - JSON/TOML encode-decode failures
//! ├── Configuration   - bad or missing config values
//! └── Custom          - application-defined, carries a free-text message
//! ```

use thiserror::Error;

/// Errors that can occur while talking to or configuring a chat model.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The request could not reach the provider, or the provider's
    /// response could not be parsed into a `ChatResponse`.
    #[error("transport error: {0}")]
    Transport(String),

    /// A single LLM call did not complete within its configured deadline.
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The provider signalled rate limiting.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// A request or response failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Application-defined error not covered above.
    #[error("{0}")]
    Custom(String),
}

/// Convenience result alias used throughout the MDAP crates.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = CoreError::Validation("bad shape".to_string());
        assert_eq!(e.to_string(), "validation error: bad shape");
    }

    #[test]
    fn test_from_serde() {
        let bad: std::result::Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: CoreError = bad.unwrap_err().into();
        assert!(matches!(err, CoreError::Serialization(_)));
    }
}
