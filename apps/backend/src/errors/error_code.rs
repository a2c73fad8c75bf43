//! Error codes for the beer game API.
//!
//! Add new codes here; never pass ad-hoc strings as error codes. Every code
//! is SCREAMING_SNAKE_CASE and maps 1:1 to the string that appears in HTTP
//! problem responses and websocket `error` frames.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Request Validation
    /// Operation not valid in the current game phase
    PhaseMismatch,
    /// Group already finished its final week
    GameEnded,
    /// A team still has unclaimed or disconnected seats
    IncompleteTeam,
    /// No teams exist yet
    NoTeams,
    /// Order quantity rejected
    InvalidQuantity,
    /// Team definition rejected
    InvalidTeam,
    /// Username missing or malformed
    InvalidUsername,
    /// General validation error
    ValidationError,
    /// Malformed request body or frame
    BadRequest,

    // Resource Not Found
    GroupNotFound,
    UserNotFound,
    RoleNotFound,
    /// General not found error
    NotFound,

    // Conflicts
    /// Username connected on another session
    UsernameInUse,
    /// The game already left the lobby
    AlreadyStarted,
    /// Generic conflict (fallback for unmatched conflicts)
    Conflict,

    // System Errors
    /// Internal state broken
    InvariantViolation,
    /// Internal server error
    Internal,
    /// Configuration error
    ConfigError,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PhaseMismatch => "PHASE_MISMATCH",
            Self::GameEnded => "GAME_ENDED",
            Self::IncompleteTeam => "INCOMPLETE_TEAM",
            Self::NoTeams => "NO_TEAMS",
            Self::InvalidQuantity => "INVALID_QUANTITY",
            Self::InvalidTeam => "INVALID_TEAM",
            Self::InvalidUsername => "INVALID_USERNAME",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",

            Self::GroupNotFound => "GROUP_NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::RoleNotFound => "ROLE_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",

            Self::UsernameInUse => "USERNAME_IN_USE",
            Self::AlreadyStarted => "ALREADY_STARTED",
            Self::Conflict => "CONFLICT",

            Self::InvariantViolation => "INVARIANT_VIOLATION",
            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
