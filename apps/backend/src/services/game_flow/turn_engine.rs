use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::{error, info};

use super::{GameFlowService, GroupSlot};
use crate::domain::pipeline::advance_week;
use crate::domain::snapshot::{GameSummary, GroupResult, GroupSnapshot, ParticipantSnapshot};
use crate::domain::state::{GamePhase, GroupState};
use crate::errors::domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Advanced {
    pub week: u32,
    pub group_complete: bool,
}

impl GameFlowService {
    /// Run one week for a locked group and fan out the results.
    ///
    /// The caller holds `slot.state` and must call
    /// [`check_game_complete`](Self::check_game_complete) after releasing it
    /// when the group just completed.
    pub(super) fn advance_locked(
        &self,
        slot: &Arc<GroupSlot>,
        state: &mut GroupState,
    ) -> Result<Advanced, DomainError> {
        let rules = &self.inner.config.rules;
        let report = advance_week(state, rules)?;
        slot.week.store(state.week, Ordering::Release);

        if let Err(err) = state.check_invariants() {
            error!(group_id = %state.id, error = %err, "group invariant broken after advance");
        }
        info!(
            group_id = %state.id,
            week = state.week,
            demand = report.customer_demand,
            group_cost = state.cost,
            "advance"
        );

        let notifier = self.notifier();
        for participant in &state.participants {
            notifier.next_turn(
                participant.connection,
                state.id,
                state.week,
                &ParticipantSnapshot::from(participant),
            );
        }
        notifier.group_updated(
            self.rank_of(state.id),
            &GroupSnapshot::from(&*state),
            &state.connections(),
        );

        let group_complete = state.is_complete(rules.max_weeks);
        if group_complete {
            info!(group_id = %state.id, week = state.week, group_cost = state.cost, "group complete");
        } else if self.phase() == GamePhase::Running {
            self.request_ai_orders(slot, state);
        }

        Ok(Advanced {
            week: state.week,
            group_complete,
        })
    }

    /// End the game once every live group has played its final week, or
    /// once no group is left to play. The empty case reports `ended_early`.
    ///
    /// Returns `true` only for the call that performed the transition. Must
    /// not be called while holding a group lock.
    pub(super) fn check_game_complete(&self) -> bool {
        if self.phase() != GamePhase::Running {
            return false;
        }
        let max_weeks = self.inner.config.rules.max_weeks;
        let slots = self.ordered_slots();
        if slots
            .iter()
            .any(|slot| slot.week.load(Ordering::Acquire) < max_weeks)
        {
            return false;
        }
        if !self.inner.phase.transition(GamePhase::Running, GamePhase::Ended) {
            return false;
        }

        let summary = self.summary(slots.is_empty());
        info!(groups = summary.groups.len(), ended_early = summary.ended_early, "game ended");
        self.notifier().game_ended(&summary);
        true
    }

    pub(super) fn summary(&self, ended_early: bool) -> GameSummary {
        let groups = self
            .ordered_slots()
            .iter()
            .enumerate()
            .map(|(rank, slot)| {
                let state = slot.state.lock();
                GroupResult::from_state(rank, &state)
            })
            .collect();
        GameSummary {
            ended_early,
            max_weeks: self.inner.config.rules.max_weeks,
            groups,
        }
    }
}
