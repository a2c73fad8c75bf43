//! Outbound event seam between the engine and the connection layer.
//!
//! Every method must return promptly: the engine calls them while holding a
//! group's lock. Implementations queue or forward and never wait on I/O.

use parking_lot::Mutex;

use crate::domain::participant::ConnectionId;
use crate::domain::roles::RoleKind;
use crate::domain::snapshot::{GameSummary, GroupSnapshot, ParticipantSnapshot};
use crate::domain::state::GroupId;

pub trait Notifier: Send + Sync {
    /// A participant's new state after an advance. `connection` is `None`
    /// for AI participants and disconnected humans.
    fn next_turn(
        &self,
        connection: Option<ConnectionId>,
        group_id: GroupId,
        week: u32,
        participant: &ParticipantSnapshot,
    );

    /// Aggregate group view for admin observers and the group's seated
    /// `members`. `rank` is the group's current position in the lobby listing.
    fn group_updated(&self, rank: usize, group: &GroupSnapshot, members: &[ConnectionId]);

    fn order_wait_updated(&self, group_id: GroupId, remaining: &[RoleKind], members: &[ConnectionId]);

    fn game_started(&self);

    fn game_reset(&self);

    fn game_ended(&self, summary: &GameSummary);

    /// The group is gone; `kicked` lists the connections that were seated in it.
    fn group_removed(&self, group_id: GroupId, kicked: &[ConnectionId]);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn next_turn(&self, _: Option<ConnectionId>, _: GroupId, _: u32, _: &ParticipantSnapshot) {}
    fn group_updated(&self, _: usize, _: &GroupSnapshot, _: &[ConnectionId]) {}
    fn order_wait_updated(&self, _: GroupId, _: &[RoleKind], _: &[ConnectionId]) {}
    fn game_started(&self) {}
    fn game_reset(&self) {}
    fn game_ended(&self, _: &GameSummary) {}
    fn group_removed(&self, _: GroupId, _: &[ConnectionId]) {}
}

/// Owned copy of one notification.
#[derive(Debug, Clone, PartialEq)]
pub enum NotifyEvent {
    NextTurn {
        connection: Option<ConnectionId>,
        group_id: GroupId,
        week: u32,
        participant: ParticipantSnapshot,
    },
    GroupUpdated {
        rank: usize,
        group: GroupSnapshot,
        members: Vec<ConnectionId>,
    },
    OrderWait {
        group_id: GroupId,
        remaining: Vec<RoleKind>,
        members: Vec<ConnectionId>,
    },
    GameStarted,
    GameReset,
    GameEnded(GameSummary),
    GroupRemoved {
        group_id: GroupId,
        kicked: Vec<ConnectionId>,
    },
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<NotifyEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NotifyEvent> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<NotifyEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn count(&self, pred: impl Fn(&NotifyEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| pred(e)).count()
    }

    fn push(&self, event: NotifyEvent) {
        self.events.lock().push(event);
    }
}

impl Notifier for RecordingNotifier {
    fn next_turn(
        &self,
        connection: Option<ConnectionId>,
        group_id: GroupId,
        week: u32,
        participant: &ParticipantSnapshot,
    ) {
        self.push(NotifyEvent::NextTurn {
            connection,
            group_id,
            week,
            participant: participant.clone(),
        });
    }

    fn group_updated(&self, rank: usize, group: &GroupSnapshot, members: &[ConnectionId]) {
        self.push(NotifyEvent::GroupUpdated {
            rank,
            group: group.clone(),
            members: members.to_vec(),
        });
    }

    fn order_wait_updated(&self, group_id: GroupId, remaining: &[RoleKind], members: &[ConnectionId]) {
        self.push(NotifyEvent::OrderWait {
            group_id,
            remaining: remaining.to_vec(),
            members: members.to_vec(),
        });
    }

    fn game_started(&self) {
        self.push(NotifyEvent::GameStarted);
    }

    fn game_reset(&self) {
        self.push(NotifyEvent::GameReset);
    }

    fn game_ended(&self, summary: &GameSummary) {
        self.push(NotifyEvent::GameEnded(summary.clone()));
    }

    fn group_removed(&self, group_id: GroupId, kicked: &[ConnectionId]) {
        self.push(NotifyEvent::GroupRemoved {
            group_id,
            kicked: kicked.to_vec(),
        });
    }
}
