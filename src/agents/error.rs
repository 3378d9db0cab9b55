//! Error types for the agent runtime bridge

use thiserror::Error;

/// Errors that can occur while talking to the agent runtime
#[derive(Debug, Error)]
pub enum AgentError {
    /// The runtime binary could not be started or the handshake failed
    #[error("Runtime startup failed: {0}")]
    Startup(String),

    /// The runtime rejected a resume request
    #[error("Failed to resume session {session_id}: {message}")]
    Resume { session_id: String, message: String },

    /// The runtime rejected a create request
    #[error("Failed to create session: {0}")]
    Create(String),

    /// No terminal event arrived before the deadline
    #[error("Timeout after {0}s waiting for session.idle")]
    Timeout(u64),

    /// Request rejected locally before reaching the runtime
    #[error("Validation error: {0}")]
    Validation(String),

    /// The runtime reported a failure for a running session
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// The connection to the runtime process broke
    #[error("Transport error: {0}")]
    Transport(String),

    /// Payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The runtime asked for a tool nobody registered
    #[error("Tool not found: {0}")]
    ToolNotFound(String),
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AgentError {
    fn from(err: std::io::Error) -> Self {
        AgentError::Transport(format!("IO error: {}", err))
    }
}

/// Result type alias for runtime operations
pub type Result<T> = std::result::Result<T, AgentError>;
