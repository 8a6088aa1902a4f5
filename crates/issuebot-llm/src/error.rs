//! Completion provider error types.
//!
//! All provider subsystems surface errors through [`LlmError`].  Each variant
//! carries enough context for callers to decide how to handle the failure.

/// Unified error type for the completion provider layer.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    // -- Request errors ------------------------------------------------------
    /// An HTTP request to the completion endpoint failed.
    #[error("completion request failed: {reason}")]
    RequestFailed { reason: String },

    /// The completion response could not be parsed into the expected format.
    #[error("completion response parse error: {reason}")]
    ParseFailed { reason: String },

    /// The endpoint returned a well-formed response with no choices.
    #[error("completion response contained no choices")]
    EmptyCompletion,

    /// The request exceeded its deadline.
    #[error("completion request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    // -- Configuration errors ------------------------------------------------
    /// Client configuration validation failed.
    #[error("config error: {reason}")]
    ConfigError { reason: String },

    // -- Serialization -------------------------------------------------------
    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the provider crate.
pub type Result<T> = std::result::Result<T, LlmError>;
