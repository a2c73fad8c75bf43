use std::sync::atomic::Ordering;

use tracing::{error, info};

use super::GameFlowService;
use crate::domain::snapshot::{GameSummary, GroupSnapshot};
use crate::domain::state::GamePhase;
use crate::errors::domain::{ConflictKind, DomainError, ValidationKind};

impl GameFlowService {
    /// Leave the lobby and advance every group out of week 0.
    pub fn start_game(&self) -> Result<(), DomainError> {
        let _lifecycle = self.inner.lifecycle.lock();
        if self.phase() != GamePhase::Lobby {
            return Err(DomainError::conflict(
                ConflictKind::AlreadyStarted,
                "game has already begun",
            ));
        }

        let slots = self.ordered_slots();
        if slots.is_empty() {
            return Err(DomainError::validation(
                ValidationKind::NoTeams,
                "create at least one team first",
            ));
        }
        for slot in &slots {
            let state = slot.state.lock();
            if let Some(p) = state.participants.iter().find(|p| !p.is_seated()) {
                return Err(DomainError::validation(
                    ValidationKind::IncompleteTeam,
                    format!(
                        "group {} is waiting for a {}",
                        state.id,
                        p.role_kind().display_name()
                    ),
                ));
            }
        }

        self.inner.phase.set(GamePhase::Running);
        info!(groups = slots.len(), "game started");
        self.notifier().game_started();

        let mut any_complete = false;
        for slot in &slots {
            let mut state = slot.state.lock();
            match self.advance_locked(slot, &mut state) {
                Ok(advanced) => any_complete |= advanced.group_complete,
                Err(err) => error!(group_id = %slot.id, error = %err, "initial advance failed"),
            }
        }
        if any_complete {
            self.check_game_complete();
        }
        Ok(())
    }

    /// Back to the lobby with every group at week 0. Seats are kept.
    pub fn reset_game(&self) -> Result<(), DomainError> {
        let _lifecycle = self.inner.lifecycle.lock();
        if !self.phase().is_started() {
            return Err(DomainError::validation(
                ValidationKind::PhaseMismatch,
                "game has not started",
            ));
        }
        self.inner.phase.set(GamePhase::Lobby);

        let rules = &self.inner.config.rules;
        let mut snapshots = Vec::new();
        for slot in self.ordered_slots() {
            let mut state = slot.state.lock();
            state.reset(rules);
            slot.week.store(state.week, Ordering::Release);
            snapshots.push((GroupSnapshot::from(&*state), state.connections()));
        }
        info!(groups = snapshots.len(), "game reset");

        let notifier = self.notifier();
        notifier.game_reset();
        for (rank, (snapshot, members)) in snapshots.iter().enumerate() {
            notifier.group_updated(rank, snapshot, members);
        }
        Ok(())
    }

    /// Stop a running game early.
    pub fn end_game(&self) -> Result<GameSummary, DomainError> {
        let _lifecycle = self.inner.lifecycle.lock();
        if !self.inner.phase.transition(GamePhase::Running, GamePhase::Ended) {
            return Err(DomainError::validation(
                ValidationKind::PhaseMismatch,
                "game is not running",
            ));
        }
        let summary = self.summary(true);
        info!(groups = summary.groups.len(), "game ended by admin");
        self.notifier().game_ended(&summary);
        Ok(summary)
    }
}
