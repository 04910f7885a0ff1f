use thiserror::Error;

/// Every failure the game core can report. All but `Cancelled` are caller
/// misuse: they surface at the point of violation and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReversiError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("illegal move: {0}")]
    IllegalMove(String),

    #[error("illegal state: {0}")]
    IllegalState(String),

    #[error("search was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ReversiError>;
