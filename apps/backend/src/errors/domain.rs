//! Domain-level error type used across the engine and services.
//!
//! This error type is transport-agnostic. Handlers return
//! `Result<T, crate::error::AppError>` and convert from `DomainError`
//! through `From<DomainError> for AppError`; websocket sessions map it to
//! an `error` frame.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Business-rule violations raised by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationKind {
    /// Operation not allowed in the current game phase.
    PhaseMismatch,
    /// The group already played its final week, or the game ended.
    GameEnded,
    /// A group still has unclaimed or disconnected human seats.
    IncompleteTeam,
    /// Start was requested with no groups at all.
    NoTeams,
    /// Order quantity outside the accepted range.
    InvalidQuantity,
    /// Team definition rejected (wrong size, unknown model, bad role).
    InvalidTeam,
    InvalidUsername,
    /// Group structure broken; indicates an engine bug.
    InvariantViolation,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotFoundKind {
    Group,
    User,
    Role,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConflictKind {
    /// The username is already connected on another session.
    UsernameInUse,
    /// The game already left the lobby.
    AlreadyStarted,
    Other(String),
}

/// Central domain error type
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    Validation(ValidationKind, String),
    Conflict(ConflictKind, String),
    NotFound(NotFoundKind, String),
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DomainError::Validation(kind, d) => write!(f, "validation {kind:?}: {d}"),
            DomainError::Conflict(kind, d) => write!(f, "conflict {kind:?}: {d}"),
            DomainError::NotFound(kind, d) => write!(f, "not found {kind:?}: {d}"),
        }
    }
}

impl Error for DomainError {}

impl DomainError {
    pub fn validation(kind: ValidationKind, detail: impl Into<String>) -> Self {
        Self::Validation(kind, detail.into())
    }
    pub fn conflict(kind: ConflictKind, detail: impl Into<String>) -> Self {
        Self::Conflict(kind, detail.into())
    }
    pub fn not_found(kind: NotFoundKind, detail: impl Into<String>) -> Self {
        Self::NotFound(kind, detail.into())
    }

    pub fn validation_kind(&self) -> Option<&ValidationKind> {
        match self {
            DomainError::Validation(kind, _) => Some(kind),
            _ => None,
        }
    }
}
