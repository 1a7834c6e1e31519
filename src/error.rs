use serde_json::Value;
use thiserror::Error;

/// Machine-readable error kinds carried in every error response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingPrompt,
    NoToolsAvailable,
    MissingToolId,
    ToolNotAvailableForAgent,
    ToolNotFound,
    ToolCallFailed,
    ProcessingFailed,
    InvalidOptions,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MissingPrompt => "MISSING_PROMPT",
            ErrorKind::NoToolsAvailable => "NO_TOOLS_AVAILABLE",
            ErrorKind::MissingToolId => "MISSING_TOOL_ID",
            ErrorKind::ToolNotAvailableForAgent => "TOOL_NOT_AVAILABLE_FOR_AGENT",
            ErrorKind::ToolNotFound => "TOOL_NOT_FOUND",
            ErrorKind::ToolCallFailed => "TOOL_CALL_FAILED",
            ErrorKind::ProcessingFailed => "PROCESSING_FAILED",
            ErrorKind::InvalidOptions => "INVALID_OPTIONS",
        }
    }

    /// HTTP-equivalent status used by transport adapters.
    pub fn status(self) -> u16 {
        match self {
            ErrorKind::MissingPrompt | ErrorKind::MissingToolId | ErrorKind::InvalidOptions => 400,
            ErrorKind::ToolNotAvailableForAgent | ErrorKind::ToolNotFound => 404,
            ErrorKind::ProcessingFailed => 500,
            ErrorKind::ToolCallFailed => 502,
            ErrorKind::NoToolsAvailable => 503,
        }
    }

    pub fn retryable(self) -> bool {
        matches!(self, ErrorKind::ProcessingFailed)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    /// Raw options did not conform to the engine's schema.
    #[error("invalid options for {tool}: {message}")]
    InvalidOptions { tool: String, message: String },

    #[error("Tool '{0}' not found.")]
    ToolNotFound(String),

    #[error("Tool '{0}' is not available to the agent or does not exist.")]
    ToolNotAvailable(String),

    #[error("no tools are available for automatic selection")]
    NoToolsAvailable,

    /// Execution-time failure inside an engine.
    #[error("{0}")]
    Processing(String),

    /// A forwarded call to another tool failed.
    #[error("tool call failed with status {status}")]
    UpstreamCall { status: u16, body: Value },
}

impl ToolError {
    pub fn invalid(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::Processing(message.into())
    }

    /// Wraps any displayable cause under an operation prefix, e.g. "Failed to merge PDFs: ...".
    pub fn failed(op: &str, cause: impl std::fmt::Display) -> Self {
        Self::Processing(format!("{op}: {cause}"))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::InvalidOptions { .. } => ErrorKind::InvalidOptions,
            ToolError::ToolNotFound(_) => ErrorKind::ToolNotFound,
            ToolError::ToolNotAvailable(_) => ErrorKind::ToolNotAvailableForAgent,
            ToolError::NoToolsAvailable => ErrorKind::NoToolsAvailable,
            ToolError::Processing(_) => ErrorKind::ProcessingFailed,
            ToolError::UpstreamCall { .. } => ErrorKind::ToolCallFailed,
        }
    }
}

impl From<tokio::task::JoinError> for ToolError {
    fn from(e: tokio::task::JoinError) -> Self {
        ToolError::Processing(format!("worker task failed: {e}"))
    }
}
