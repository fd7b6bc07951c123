use thiserror::Error;

/// Error types for the exam session coordinator
#[derive(Debug, Error)]
pub enum SessionError {
    /// Admission protocol errors (request/approve/reject denied by backend)
    #[error("Admission denied: {0}")]
    Admission(String),

    /// Credential errors at room join time
    #[error("Missing or invalid room credential: {0}")]
    Credential(String),

    /// Real-time transport failed to establish a connection
    #[error("Failed to join room: {0}")]
    TransportJoin(String),

    #[error("Not connected to a room")]
    NotConnected,

    /// Messaging errors
    #[error("Failed to send message: {0}")]
    MessageSend(String),

    #[error("No student selected for direct message")]
    NoDirectTarget,

    /// Schedule errors
    #[error("Invalid exam schedule: {0}")]
    InvalidSchedule(String),

    /// Backend communication errors
    #[error("Backend request failed: {0}")]
    Backend(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to serialize message: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Convenience type alias for Results using SessionError
pub type Result<T> = std::result::Result<T, SessionError>;

impl SessionError {
    /// Helper to create Internal errors with context
    pub fn internal(msg: impl Into<String>) -> Self {
        SessionError::Internal(msg.into())
    }

    /// Helper to create backend errors
    pub fn backend(msg: impl Into<String>) -> Self {
        SessionError::Backend(msg.into())
    }

    /// Helper to create admission errors
    pub fn admission(msg: impl Into<String>) -> Self {
        SessionError::Admission(msg.into())
    }

    /// Whether the error leaves the session state machine unchanged and the
    /// operation safe to retry by the initiating user.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SessionError::Admission(_)
                | SessionError::MessageSend(_)
                | SessionError::NoDirectTarget
                | SessionError::Backend(_)
                | SessionError::Http(_)
        )
    }
}
