//! Error types for the agentrail domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external collaborator (retrieval service, tool backends,
//! generation backend) has its own error enum.

use thiserror::Error;

/// The top-level error type for agentrail operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Retrieval errors ---
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Generation backend errors ---
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// The vector retrieval service could not produce passages.
///
/// Always recovered by the orchestrator as "no passages".
#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Retrieval service unavailable: {0}")]
    Unavailable(String),

    #[error("Retrieval timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid retrieval response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    /// No tool is registered for the requested identifier.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_ms}ms")]
    Timeout { tool_name: String, timeout_ms: u64 },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// The optional language-generation backend failed.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("Generation backend not configured: {0}")]
    NotConfigured(String),

    #[error("Generation backend unavailable: {0}")]
    Unavailable(String),

    #[error("Generation timed out: {0}")]
    Timeout(String),

    #[error("Generation API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Could not parse generation output: {0}")]
    Unparseable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_error_displays_correctly() {
        let err = Error::Tool(ToolError::ExecutionFailed {
            tool_name: "CSV".into(),
            reason: "catalog missing".into(),
        });
        assert!(err.to_string().contains("CSV"));
        assert!(err.to_string().contains("catalog missing"));
    }

    #[test]
    fn retrieval_timeout_displays_millis() {
        let err = Error::from(RetrievalError::Timeout { timeout_ms: 250 });
        assert!(err.to_string().contains("250ms"));
    }

    #[test]
    fn generation_api_error_includes_status() {
        let err = GenerationError::ApiError {
            status_code: 503,
            message: "overloaded".into(),
        };
        assert!(err.to_string().contains("503"));
    }
}
