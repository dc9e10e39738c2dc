//! Error types for LLM provider implementations.

use thiserror::Error;

/// Result type for LLM operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur when working with LLM providers.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Failed to serialize/deserialize data.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// API authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// API key not found in environment.
    #[error("API key not found: {0}")]
    ApiKeyNotFound(String),

    /// Provider service unavailable (e.g. local server not running).
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Invalid response from provider.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Request timeout.
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// General provider error.
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Generic error with context.
    #[error("{0}")]
    Other(String),
}

impl LlmError {
    /// Check if this error is retryable. The engine's LLM client wrapper
    /// consults this to decide whether to apply its retry/backoff policy.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::HttpError(_)
                | LlmError::ServiceUnavailable(_)
                | LlmError::Timeout(_)
                | LlmError::RateLimitExceeded(_)
        )
    }

    /// Check if this error is due to authentication.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            LlmError::AuthenticationError(_) | LlmError::ApiKeyNotFound(_)
        )
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::SerializationError(err.to_string())
    }
}

/// Map a provider error onto the engine's well-defined failure modes, so the
/// retry policy in `mdap-engine` can distinguish a timeout from a rate limit
/// from a hard transport failure without knowing which provider is in use.
impl From<LlmError> for mdap_core::error::CoreError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout(msg) => mdap_core::error::CoreError::Custom(format!("timeout: {msg}")),
            LlmError::RateLimitExceeded(msg) => mdap_core::error::CoreError::RateLimited(msg),
            LlmError::HttpError(_) | LlmError::ServiceUnavailable(_) => {
                mdap_core::error::CoreError::Transport(err.to_string())
            }
            LlmError::AuthenticationError(_) | LlmError::ApiKeyNotFound(_) => {
                mdap_core::error::CoreError::Configuration(err.to_string())
            }
            LlmError::SerializationError(_) | LlmError::InvalidResponse(_) => {
                mdap_core::error::CoreError::Validation(err.to_string())
            }
            LlmError::ProviderError(_) | LlmError::Other(_) => {
                mdap_core::error::CoreError::Custom(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(LlmError::Timeout("slow".into()).is_retryable());
        assert!(!LlmError::AuthenticationError("bad key".into()).is_retryable());
    }

    #[test]
    fn test_is_auth_error() {
        assert!(LlmError::ApiKeyNotFound("FOO".into()).is_auth_error());
        assert!(!LlmError::Other("x".into()).is_auth_error());
    }

    #[test]
    fn test_maps_onto_core_error() {
        let core: mdap_core::error::CoreError = LlmError::RateLimitExceeded("slow down".into()).into();
        assert!(matches!(core, mdap_core::error::CoreError::RateLimited(_)));
    }
}
