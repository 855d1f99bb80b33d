//! Error types surfaced by the console library

use thiserror::Error;

/// Failure of a mutating call against the agent's command API
#[derive(Error, Debug)]
pub enum CommandError {
    /// The agent answered 401: the shared secret is missing or wrong
    #[error("Agent rejected the shared secret (401)")]
    Unauthorized,

    #[error("Agent returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Request to agent failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Key rotation rejected: {0}")]
    KeyRotationRejected(String),

    #[error("Failed to decode agent response: {0}")]
    Decode(String),
}

impl CommandError {
    /// True when the operator needs to fix their credential rather than retry
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, CommandError::Unauthorized)
    }
}

/// Failure of a control-session operation
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Criteria are locked while the agent is running")]
    Locked,

    #[error("Agent is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Command(#[from] CommandError),
}

impl SessionError {
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, SessionError::Command(e) if e.is_auth_failure())
    }
}

/// A push event whose payload did not have the expected shape
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventError {
    #[error("Malformed '{event}' payload: {reason}")]
    Malformed { event: String, reason: String },
}

impl EventError {
    pub(crate) fn malformed(event: &str, reason: impl ToString) -> Self {
        EventError::Malformed {
            event: event.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;
pub type SessionResult<T> = Result<T, SessionError>;
