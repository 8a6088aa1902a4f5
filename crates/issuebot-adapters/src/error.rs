//! Adapter error types.
//!
//! All remote-session subsystems surface errors through [`AdapterError`].
//! Each variant carries enough context for callers to decide how to handle
//! the failure without inspecting opaque strings.

/// Unified error type for issuebot adapters.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// An HTTP request to the tool service failed.
    #[error("request failed: {reason}")]
    RequestFailed { reason: String },

    /// The tool service returned a JSON-RPC error.
    #[error("remote error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// A tool invocation completed but reported failure.
    #[error("tool `{tool_name}` failed: {reason}")]
    ToolCallFailed { tool_name: String, reason: String },

    /// The service response could not be interpreted.
    #[error("invalid response: {reason}")]
    InvalidResponse { reason: String },

    /// An operation exceeded its time limit.
    #[error("timeout after {seconds}s: {reason}")]
    Timeout { seconds: u64, reason: String },

    /// Endpoint configuration is invalid.
    #[error("config error: {reason}")]
    ConfigError { reason: String },

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the adapters crate.
pub type Result<T> = std::result::Result<T, AdapterError>;
