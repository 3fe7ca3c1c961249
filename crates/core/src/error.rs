//! Error types for the react-agent domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! The model and tool collaborators each have their own error enum; the
//! top-level [`Error`] is what a run surfaces to its caller.

use thiserror::Error;

/// The top-level error type for agent runs.
#[derive(Debug, Error)]
pub enum Error {
    /// The iteration cap was reached without a final answer.
    #[error("Loop limit exceeded: no final answer after {max_iterations} reasoning steps")]
    LoopLimitExceeded { max_iterations: u32 },

    /// A collaborator (model or tool service) failed fatally.
    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    /// The initial conversation state was rejected.
    #[error("Invalid conversation state: {0}")]
    InvalidState(String),
}

impl Error {
    /// Short machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LoopLimitExceeded { .. } => "loop_limit_exceeded",
            Self::CollaboratorUnavailable(_) => "collaborator_unavailable",
            Self::InvalidState(_) => "invalid_state",
        }
    }
}

impl From<ProviderError> for Error {
    fn from(err: ProviderError) -> Self {
        Self::CollaboratorUnavailable(format!("model: {err}"))
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Collaborator errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_ms}ms")]
    Timeout { tool_name: String, timeout_ms: u64 },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    /// The tool-execution service itself is gone. Aborts the run.
    #[error("Tool service unavailable: {0}")]
    Unavailable(String),
}

impl ToolError {
    /// Whether this failure must abort the run instead of being fed back
    /// to the reasoning step.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
