use crate::domain::models::Mode;
use thiserror::Error;

/// A requested operation was refused. The state it targeted is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("username already exists: {0}")]
    DuplicateUsername(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("duration must be > 0 seconds")]
    InvalidDuration,
    #[error("rating must be between 1 and 5 (got {0})")]
    InvalidRating(u8),
    #[error("{0} must not be empty")]
    MissingRequiredField(&'static str),
    #[error("{field} must be HH:MM (got '{value}')")]
    InvalidTime { field: &'static str, value: String },
    #[error("unknown weekday: {0}")]
    InvalidDay(String),
    #[error("mode cannot change while a {0} session is active")]
    ModeLocked(Mode),
    #[error("a session is already active")]
    AlreadyActive,
    #[error("no session is running or paused")]
    NotActive,
    #[error("no completed session is waiting for a rating")]
    NotAwaitingRating,
}
