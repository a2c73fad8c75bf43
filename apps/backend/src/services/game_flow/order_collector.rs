use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info};

use super::{GameFlowService, GroupSlot};
use crate::ai::DecisionRequest;
use crate::domain::participant::ConnectionId;
use crate::domain::roles::RoleKind;
use crate::domain::snapshot::{GroupSnapshot, ParticipantSnapshot};
use crate::domain::state::{GamePhase, GroupId, GroupState};
use crate::errors::domain::{DomainError, NotFoundKind, ValidationKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Recorded; these roles still owe an order.
    Waiting { remaining: Vec<RoleKind> },
    /// This submission completed the set and the group moved to `week`.
    Advanced { week: u32 },
}

/// Identifies the week an AI batch was requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BatchTicket {
    epoch: u32,
    week: u32,
}

impl GameFlowService {
    /// Record `quantity` as `role`'s pending order in `group_id`.
    ///
    /// Last write wins. The group advances only when this call removed the
    /// last role from the waiting set; a resubmission never advances twice.
    pub fn submit_order(
        &self,
        group_id: GroupId,
        role: RoleKind,
        quantity: i64,
    ) -> Result<SubmitOutcome, DomainError> {
        let quantity = self.validate_quantity(quantity)?;
        self.ensure_accepting_orders()?;
        let slot = self
            .slot(group_id)
            .ok_or_else(|| DomainError::not_found(NotFoundKind::Group, format!("group {group_id}")))?;

        let (outcome, completed) = {
            let mut state = slot.state.lock();
            if slot.is_removed() {
                return Err(DomainError::not_found(
                    NotFoundKind::Group,
                    format!("group {group_id}"),
                ));
            }
            if state.is_complete(self.inner.config.rules.max_weeks) {
                return Err(DomainError::validation(
                    ValidationKind::GameEnded,
                    format!("group {group_id} finished week {}", state.week),
                ));
            }
            // Week 0 belongs to `start_game`, which advances every group
            // itself once the phase reads `Running`.
            if state.week == 0 {
                return Err(DomainError::validation(
                    ValidationKind::PhaseMismatch,
                    format!("group {group_id} has not opened week 1 yet"),
                ));
            }

            let removed = state.record_order(role, quantity);
            debug!(group_id = %group_id, role = %role, quantity, removed, "order recorded");
            if removed && state.is_ready() {
                let advanced = self.advance_locked(&slot, &mut state)?;
                (
                    SubmitOutcome::Advanced {
                        week: advanced.week,
                    },
                    advanced.group_complete,
                )
            } else {
                let remaining = state.waiting_for();
                if removed {
                    self.notifier()
                        .order_wait_updated(group_id, &remaining, &state.connections());
                }
                (SubmitOutcome::Waiting { remaining }, false)
            }
        };

        if completed {
            self.check_game_complete();
        }
        Ok(outcome)
    }

    /// Submit for whichever seat `connection` is registered to.
    pub fn submit_order_for_connection(
        &self,
        connection: ConnectionId,
        quantity: i64,
    ) -> Result<(GroupId, RoleKind, SubmitOutcome), DomainError> {
        let seat = self.seat_for_connection(connection)?;
        let outcome = self.submit_order(seat.group_id, seat.role, quantity)?;
        Ok((seat.group_id, seat.role, outcome))
    }

    fn validate_quantity(&self, quantity: i64) -> Result<u32, DomainError> {
        let max = self.inner.config.max_order_quantity;
        match u32::try_from(quantity) {
            Ok(q) if q <= max => Ok(q),
            _ => Err(DomainError::validation(
                ValidationKind::InvalidQuantity,
                format!("order must be between 0 and {max}, got {quantity}"),
            )),
        }
    }

    fn ensure_accepting_orders(&self) -> Result<(), DomainError> {
        match self.phase() {
            GamePhase::Running => Ok(()),
            GamePhase::Lobby => Err(DomainError::validation(
                ValidationKind::PhaseMismatch,
                "game has not started",
            )),
            GamePhase::Ended => Err(DomainError::validation(
                ValidationKind::GameEnded,
                "game has ended",
            )),
        }
    }

    /// Ask every AI seat of a locked group for its next order.
    ///
    /// Decisions run on a spawned task; the group lock is released while
    /// they are outstanding, so human submissions for other roles land
    /// immediately.
    pub(super) fn request_ai_orders(&self, slot: &Arc<GroupSlot>, state: &GroupState) {
        let group = GroupSnapshot::from(state);
        let requests: Vec<(RoleKind, DecisionRequest)> = state
            .ai_seats()
            .filter(|(role, _)| state.waiting.contains(role))
            .map(|(role, model)| {
                (
                    role,
                    DecisionRequest {
                        group_id: state.id,
                        model: model.clone(),
                        participant: ParticipantSnapshot::from(state.participant(role)),
                        group: group.clone(),
                        rules: self.inner.config.rules.clone(),
                    },
                )
            })
            .collect();
        if requests.is_empty() {
            return;
        }

        let ticket = BatchTicket {
            epoch: state.epoch,
            week: state.week,
        };
        let service = self.clone();
        let slot = Arc::clone(slot);
        tokio::spawn(async move {
            service.run_ai_batch(slot, ticket, requests).await;
        });
    }

    async fn run_ai_batch(
        &self,
        slot: Arc<GroupSlot>,
        ticket: BatchTicket,
        requests: Vec<(RoleKind, DecisionRequest)>,
    ) {
        let delay = self.inner.resolver.timing().thinking_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let resolver = &self.inner.resolver;
        let decisions = join_all(requests.iter().map(|(role, request)| async move {
            (*role, resolver.resolve(request).await)
        }))
        .await;

        let completed = {
            let mut state = slot.state.lock();
            let current = BatchTicket {
                epoch: state.epoch,
                week: state.week,
            };
            if slot.is_removed() || current != ticket || self.phase() != GamePhase::Running {
                debug!(group_id = %slot.id, ?ticket, ?current, "discarding stale ai batch");
                return;
            }

            for (role, decision) in &decisions {
                state.record_order(*role, decision.quantity);
            }
            info!(
                group_id = %slot.id,
                week = state.week,
                decisions = decisions.len(),
                "ai orders recorded"
            );

            if state.is_ready() {
                match self.advance_locked(&slot, &mut state) {
                    Ok(advanced) => advanced.group_complete,
                    Err(err) => {
                        tracing::error!(group_id = %slot.id, error = %err, "advance failed");
                        false
                    }
                }
            } else {
                self.notifier().order_wait_updated(
                    slot.id,
                    &state.waiting_for(),
                    &state.connections(),
                );
                false
            }
        };

        if completed {
            self.check_game_complete();
        }
    }
}
