use std::sync::atomic::Ordering;

use serde::Serialize;
use tracing::info;

use super::{GameFlowService, Seat};
use crate::ai::policy_by_name;
use crate::domain::participant::{AiProvider, ConnectionId, PlayerKind};
use crate::domain::roles::RoleKind;
use crate::domain::rules::ROLES;
use crate::domain::snapshot::{GameSnapshot, GroupSnapshot, ParticipantSnapshot};
use crate::domain::state::{GamePhase, GroupId, GroupState};
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};

const MAX_USERNAME_LEN: usize = 32;

/// Result of a successful `register_user`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    pub group_id: GroupId,
    pub role: RoleKind,
    pub week: u32,
    pub phase: GamePhase,
    pub participant: ParticipantSnapshot,
    pub reconnected: bool,
}

impl GameFlowService {
    /// Add a group with the given slot kinds, in role order.
    pub fn create_team(&self, kinds: Vec<PlayerKind>) -> Result<GroupId, DomainError> {
        let _lifecycle = self.inner.lifecycle.lock();
        if self.phase() != GamePhase::Lobby {
            return Err(DomainError::validation(
                ValidationKind::PhaseMismatch,
                "teams can only be created in the lobby",
            ));
        }
        let kinds: [PlayerKind; ROLES] = kinds.try_into().map_err(|kinds: Vec<PlayerKind>| {
            DomainError::validation(
                ValidationKind::InvalidTeam,
                format!("a team needs exactly {ROLES} players, got {}", kinds.len()),
            )
        })?;
        for kind in &kinds {
            validate_kind(kind)?;
        }

        let id = self.allocate_id();
        let state = GroupState::new(id, kinds, &self.inner.config.rules);
        let snapshot = GroupSnapshot::from(&state);
        self.insert_group(state);
        info!(group_id = %id, "team created");
        self.notifier().group_updated(self.rank_of(id), &snapshot, &[]);
        Ok(id)
    }

    /// Seat `name` on `connection`.
    ///
    /// A known, disconnected name reconnects to its seat in any phase. A new
    /// name is only accepted in the lobby and takes the first open human
    /// slot in rank order, or the retailer seat of a fresh all-human group.
    pub fn register_user(
        &self,
        name: &str,
        connection: ConnectionId,
    ) -> Result<Registration, DomainError> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_USERNAME_LEN {
            return Err(DomainError::validation(
                ValidationKind::InvalidUsername,
                format!("username must be 1 to {MAX_USERNAME_LEN} characters"),
            ));
        }

        let _lifecycle = self.inner.lifecycle.lock();
        let known = self.inner.directory.get(name).map(|entry| *entry.value());
        if let Some(seat) = known {
            return self.reconnect(name, seat, connection);
        }
        if self.phase() != GamePhase::Lobby {
            return Err(DomainError::validation(
                ValidationKind::PhaseMismatch,
                "the game has already started",
            ));
        }

        for slot in self.ordered_slots() {
            let mut state = slot.state.lock();
            let Some(role) = state.open_slot() else {
                continue;
            };
            let registration = self.claim(&mut state, role, name, connection);
            let snapshot = GroupSnapshot::from(&*state);
            let members = state.connections();
            drop(state);
            self.notifier()
                .group_updated(self.rank_of(slot.id), &snapshot, &members);
            return Ok(registration);
        }

        let id = self.allocate_id();
        let mut state = GroupState::all_human(id, &self.inner.config.rules);
        let registration = self.claim(&mut state, RoleKind::Retailer, name, connection);
        let snapshot = GroupSnapshot::from(&state);
        self.insert_group(state);
        info!(group_id = %id, "human group created");
        self.notifier()
            .group_updated(self.rank_of(id), &snapshot, &[connection]);
        Ok(registration)
    }

    fn claim(
        &self,
        state: &mut GroupState,
        role: RoleKind,
        name: &str,
        connection: ConnectionId,
    ) -> Registration {
        let participant = state.participant_mut(role);
        participant.name = Some(name.to_string());
        participant.connection = Some(connection);
        self.inner.directory.insert(
            name.to_string(),
            Seat {
                group_id: state.id,
                role,
            },
        );
        self.inner.connections.insert(connection, name.to_string());
        info!(group_id = %state.id, role = %role, user = name, "seat claimed");
        Registration {
            group_id: state.id,
            role,
            week: state.week,
            phase: self.phase(),
            participant: ParticipantSnapshot::from(state.participant(role)),
            reconnected: false,
        }
    }

    fn reconnect(
        &self,
        name: &str,
        seat: Seat,
        connection: ConnectionId,
    ) -> Result<Registration, DomainError> {
        let slot = self.slot(seat.group_id).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Group, format!("group {}", seat.group_id))
        })?;
        let mut state = slot.state.lock();
        let participant = state.participant_mut(seat.role);
        if participant.connection.is_some() {
            return Err(DomainError::conflict(
                ConflictKind::UsernameInUse,
                format!("{name} is already connected"),
            ));
        }
        participant.connection = Some(connection);
        self.inner.connections.insert(connection, name.to_string());
        info!(group_id = %seat.group_id, role = %seat.role, user = name, "user reconnected");

        let registration = Registration {
            group_id: seat.group_id,
            role: seat.role,
            week: state.week,
            phase: self.phase(),
            participant: ParticipantSnapshot::from(state.participant(seat.role)),
            reconnected: true,
        };
        let snapshot = GroupSnapshot::from(&*state);
        let members = state.connections();
        drop(state);
        self.notifier()
            .group_updated(self.rank_of(seat.group_id), &snapshot, &members);
        Ok(registration)
    }

    /// Clear the connection handle of whoever is on `connection`. The seat,
    /// its name and any pending order stay as they are.
    pub fn disconnect(&self, connection: ConnectionId) {
        let Some((_, name)) = self.inner.connections.remove(&connection) else {
            return;
        };
        let Some(seat) = self.inner.directory.get(&name).map(|entry| *entry.value()) else {
            return;
        };
        let Some(slot) = self.slot(seat.group_id) else {
            return;
        };
        let mut state = slot.state.lock();
        let participant = state.participant_mut(seat.role);
        if participant.connection != Some(connection) {
            return;
        }
        participant.connection = None;
        info!(group_id = %seat.group_id, role = %seat.role, user = %name, "user disconnected");
        let snapshot = GroupSnapshot::from(&*state);
        let members = state.connections();
        drop(state);
        self.notifier()
            .group_updated(self.rank_of(seat.group_id), &snapshot, &members);
    }

    /// Delete a group. Other groups keep their ids; ranks close the gap.
    pub fn remove_group(&self, group_id: GroupId) -> Result<(), DomainError> {
        let _lifecycle = self.inner.lifecycle.lock();
        let (_, slot) = self.inner.groups.remove(&group_id).ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Group, format!("group {group_id}"))
        })?;
        slot.removed.store(true, Ordering::Release);
        self.inner.ranks.lock().retain(|&id| id != group_id);

        let kicked: Vec<ConnectionId> = {
            let state = slot.state.lock();
            for name in state.human_names() {
                self.inner.directory.remove(name);
            }
            state
                .participants
                .iter()
                .filter_map(|p| p.connection)
                .inspect(|connection| {
                    self.inner.connections.remove(connection);
                })
                .collect()
        };
        info!(group_id = %group_id, kicked = kicked.len(), "group removed");
        self.notifier().group_removed(group_id, &kicked);

        self.check_game_complete();
        Ok(())
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let groups = self
            .ordered_slots()
            .iter()
            .map(|slot| {
                let state = slot.state.lock();
                GroupSnapshot::from(&*state)
            })
            .collect();
        GameSnapshot {
            phase: self.phase(),
            max_weeks: self.inner.config.rules.max_weeks,
            user_count: self.inner.directory.len(),
            groups,
        }
    }

    pub(super) fn seat_for_connection(&self, connection: ConnectionId) -> Result<Seat, DomainError> {
        let name = self
            .inner
            .connections
            .get(&connection)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DomainError::not_found(NotFoundKind::User, "connection is not registered"))?;
        self.inner
            .directory
            .get(&name)
            .map(|entry| *entry.value())
            .ok_or_else(|| DomainError::not_found(NotFoundKind::User, format!("user {name}")))
    }
}

fn validate_kind(kind: &PlayerKind) -> Result<(), DomainError> {
    let Some(model) = kind.ai_model() else {
        return Ok(());
    };
    if model.model.trim().is_empty() {
        return Err(DomainError::validation(
            ValidationKind::InvalidTeam,
            "ai model id must not be empty",
        ));
    }
    if model.provider == AiProvider::Local && policy_by_name(&model.model).is_none() {
        return Err(DomainError::validation(
            ValidationKind::InvalidTeam,
            format!("unknown local policy {}", model.model),
        ));
    }
    Ok(())
}
