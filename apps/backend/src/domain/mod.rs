//! Domain layer: pure game logic types and helpers. No I/O, no locking.

pub mod participant;
pub mod pipeline;
pub mod roles;
pub mod rules;
pub mod snapshot;
pub mod state;

#[cfg(test)]
mod test_helpers;
#[cfg(test)]
mod tests_pipeline;
#[cfg(test)]
mod tests_props_pipeline;

// Re-exports for ergonomics
pub use participant::{AiModel, AiProvider, ConnectionId, Participant, PlayerKind};
pub use pipeline::{advance_week, Pipelines, RoleStep, WeekReport};
pub use roles::RoleKind;
pub use rules::{DemandSchedule, GameRules, ROLES};
pub use state::{GamePhase, GroupId, GroupState};
