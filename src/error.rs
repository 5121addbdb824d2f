use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum MatchpointError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("player not found: {0}")]
    PlayerNotFound(Uuid),

    #[error("game not found: {0}")]
    GameNotFound(Uuid),

    #[error("conflicting state: {0}")]
    Conflict(String),

    #[error("backend unavailable: {0}")]
    Backend(String),

    #[error("initialization failed: {0}")]
    Init(String),
}

impl MatchpointError {
    /// Transient backend failures are recovered by the next tick rather than
    /// surfaced to clients.
    pub fn is_transient(&self) -> bool {
        matches!(self, MatchpointError::Backend(_))
    }
}

pub type Result<T> = std::result::Result<T, MatchpointError>;
