use thiserror::Error;

/// Errors surfaced by the tmux-backed session bridge.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(String),

    #[error("client {client} does not hold the input lock for session {session}")]
    InputLockHeld { session: String, client: String },

    #[error("tmux command failed: {0}")]
    Tmux(String),

    #[error("failed to set up session FIFO: {0}")]
    Fifo(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("persistence error: {0}")]
    Persistence(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;

impl From<adjutant_core::json_store::JsonFileError> for SessionError {
    fn from(err: adjutant_core::json_store::JsonFileError) -> Self {
        SessionError::Persistence(err.to_string())
    }
}
