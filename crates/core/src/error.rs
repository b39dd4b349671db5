//! Error types for the LifeChat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all LifeChat operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- LLM gateway errors ---
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Record schema errors ---
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    // --- Persistence errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Orchestration errors ---
    #[error("Turn error: {0}")]
    Turn(#[from] TurnError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

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

impl ProviderError {
    /// Whether a retry has a reasonable chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Timeout(_) | Self::Network(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::AuthenticationFailed(_) | Self::NotConfigured(_) => false,
        }
    }
}

/// Failures of the LLM gateway contract (one request/response exchange).
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Transcript must contain at least one message")]
    EmptyTranscript,

    /// The model did not answer in the shape the protocol step required.
    #[error("Tool selection failed: {0}")]
    ToolSelection(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// A tool call whose argument payload is not a JSON object.
///
/// Recovered locally: the offending call is skipped, the turn continues.
#[derive(Debug, Clone, Error)]
#[error("Malformed arguments for tool call {call_id} ({tool_name}): {reason}")]
pub struct ArgumentDecodeError {
    pub call_id: String,
    pub tool_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Feeling score must be between 1 and 10, got {0}")]
    ScoreOutOfRange(i64),

    #[error("A feeling needs at least one emotion label")]
    EmptyFeelings,

    #[error("Event ends ({end}) before it starts ({start})")]
    EndBeforeStart { start: String, end: String },

    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("Cannot materialize record: {0}")]
    Materialization(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

/// Terminal failures of one chat-to-reply orchestration run.
#[derive(Debug, Clone, Error)]
pub enum TurnError {
    #[error("Chat message is empty")]
    EmptyMessage,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Turn exceeded its deadline of {secs}s")]
    DeadlineExceeded { secs: u64 },
}

impl TurnError {
    /// True when the model broke the tool-calling protocol.
    pub fn is_tool_selection(&self) -> bool {
        matches!(self, Self::Gateway(GatewayError::ToolSelection(_)))
    }
}
