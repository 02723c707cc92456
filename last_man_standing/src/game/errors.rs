//! Managed game error types.

use std::time::Duration;
use thiserror::Error;

use super::models::{GameId, ParticipantId, PickId, RoundId, UnknownVariant};
use crate::db::timeouts::TimeoutError;

/// Managed game errors
#[derive(Debug, Error)]
pub enum GameError {
    /// Game absent or owned by another manager
    #[error("Game not found: {0}")]
    NotFound(GameId),

    /// Round absent or owned by another manager
    #[error("Round not found: {0}")]
    RoundNotFound(RoundId),

    /// Participant absent or in another game
    #[error("Participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    /// Result submitted for a pick outside the round
    #[error("Pick {0} does not belong to this round")]
    PickNotFound(PickId),

    /// Request failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Round {round_number} is not open")]
    RoundNotOpen { round_number: i32 },

    #[error("Round {round_number} is not closed")]
    RoundNotClosed { round_number: i32 },

    #[error("Only the latest round ({latest}) can be reopened, not round {round_number}")]
    RoundNotLatest { round_number: i32, latest: i32 },

    #[error("Game is already completed")]
    GameCompleted,

    #[error("Game has no rounds")]
    NoRounds,

    #[error("Participant {0} has been eliminated")]
    ParticipantEliminated(String),

    #[error("Participant name already used in this game: {0}")]
    DuplicateParticipant(String),

    #[error("No result submitted for pick {pick_id}")]
    MissingResult { pick_id: PickId },

    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored value could not be decoded
    #[error("Corrupt row: {0}")]
    CorruptRow(#[from] UnknownVariant),
}

/// Coarse classification used to pick a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    Conflict,
    Internal,
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::NotFound(_)
            | GameError::RoundNotFound(_)
            | GameError::ParticipantNotFound(_) => ErrorKind::NotFound,
            GameError::PickNotFound(_)
            | GameError::InvalidInput(_)
            | GameError::DuplicateParticipant(_)
            | GameError::MissingResult { .. } => ErrorKind::BadRequest,
            GameError::RoundNotOpen { .. }
            | GameError::RoundNotClosed { .. }
            | GameError::RoundNotLatest { .. }
            | GameError::GameCompleted
            | GameError::NoRounds
            | GameError::ParticipantEliminated(_) => ErrorKind::Conflict,
            GameError::Timeout(_) | GameError::Database(_) | GameError::CorruptRow(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Not-found messages omit the id so callers cannot probe which ids exist.
    pub fn client_message(&self) -> String {
        match self {
            GameError::NotFound(_) => "Game not found".to_string(),
            GameError::RoundNotFound(_) => "Round not found".to_string(),
            GameError::ParticipantNotFound(_) => "Participant not found".to_string(),
            GameError::Timeout(_) | GameError::Database(_) | GameError::CorruptRow(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl From<TimeoutError> for GameError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Timeout(duration) => GameError::Timeout(duration),
            TimeoutError::Database(e) => GameError::Database(e),
        }
    }
}

/// Result type for managed game operations
pub type GameResult<T> = Result<T, GameError>;
