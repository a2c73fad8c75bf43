use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::participant::{AiModel, ConnectionId, Participant, PlayerKind};
use crate::domain::pipeline::{Pipelines, MAILING_DELAY, SHIPPING_DELAY};
use crate::domain::roles::RoleKind;
use crate::domain::rules::{GameRules, ROLES};
use crate::errors::domain::{DomainError, ValidationKind};

/// Stable group identifier. Never reused or renumbered within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process-wide game lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Teams are being formed; no group advances.
    Lobby,
    /// Groups advance independently.
    Running,
    /// Every group finished, or an admin ended the game early.
    Ended,
}

impl GamePhase {
    pub const fn as_u8(self) -> u8 {
        match self {
            GamePhase::Lobby => 0,
            GamePhase::Running => 1,
            GamePhase::Ended => 2,
        }
    }

    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => GamePhase::Running,
            2 => GamePhase::Ended,
            _ => GamePhase::Lobby,
        }
    }

    pub fn is_started(self) -> bool {
        !matches!(self, GamePhase::Lobby)
    }
}

/// Full mutable state of one playthrough.
#[derive(Debug, Clone)]
pub struct GroupState {
    pub id: GroupId,
    /// Index `i` always holds the participant playing `RoleKind::ALL[i]`.
    pub participants: [Participant; ROLES],
    pub week: u32,
    pub cost: f64,
    pub cost_history: Vec<f64>,
    pub pipelines: Pipelines,
    /// Roles whose order for the next advance is still missing.
    pub waiting: BTreeSet<RoleKind>,
    /// Bumped on every reset so work started for an earlier run can be told
    /// apart from work for the current one.
    pub epoch: u32,
}

impl GroupState {
    pub fn new(id: GroupId, kinds: [PlayerKind; ROLES], rules: &GameRules) -> Self {
        let mut kinds = kinds.into_iter();
        let participants = RoleKind::ALL.map(|role| {
            let kind = kinds.next().unwrap_or(PlayerKind::Human);
            Participant::new(kind, role, rules)
        });
        Self {
            id,
            participants,
            week: 0,
            cost: 0.0,
            cost_history: Vec::new(),
            pipelines: Pipelines::seeded(rules.starting_throughput),
            waiting: RoleKind::ALL.into_iter().collect(),
            epoch: 0,
        }
    }

    /// A group whose four slots are all open human seats.
    pub fn all_human(id: GroupId, rules: &GameRules) -> Self {
        Self::new(id, std::array::from_fn(|_| PlayerKind::Human), rules)
    }

    pub fn participant(&self, role: RoleKind) -> &Participant {
        &self.participants[role.index()]
    }

    pub fn participant_mut(&mut self, role: RoleKind) -> &mut Participant {
        &mut self.participants[role.index()]
    }

    /// Store `quantity` as the role's pending upstream order.
    ///
    /// Last write wins. Returns `true` only when this call took the role out
    /// of the waiting set.
    pub fn record_order(&mut self, role: RoleKind, quantity: u32) -> bool {
        self.participant_mut(role).role.upstream.orders = quantity;
        self.waiting.remove(&role)
    }

    pub fn waiting_for(&self) -> Vec<RoleKind> {
        self.waiting.iter().copied().collect()
    }

    pub fn is_ready(&self) -> bool {
        self.waiting.is_empty()
    }

    pub fn is_complete(&self, max_weeks: u32) -> bool {
        self.week >= max_weeks
    }

    /// First unclaimed human seat, in role order.
    pub fn open_slot(&self) -> Option<RoleKind> {
        self.participants
            .iter()
            .find(|p| p.is_open_slot())
            .map(Participant::role_kind)
    }

    pub fn is_fully_seated(&self) -> bool {
        self.participants.iter().all(Participant::is_seated)
    }

    pub fn ai_seats(&self) -> impl Iterator<Item = (RoleKind, &AiModel)> {
        self.participants
            .iter()
            .filter_map(|p| p.kind.ai_model().map(|model| (p.role_kind(), model)))
    }

    /// Connections currently seated in this group.
    pub fn connections(&self) -> Vec<ConnectionId> {
        self.participants.iter().filter_map(|p| p.connection).collect()
    }

    pub fn human_names(&self) -> impl Iterator<Item = &str> {
        self.participants
            .iter()
            .filter(|p| p.kind.is_human())
            .filter_map(|p| p.name.as_deref())
    }

    /// Back to week 0 with starting stock. Membership is preserved.
    pub fn reset(&mut self, rules: &GameRules) {
        for participant in &mut self.participants {
            participant.reset(rules);
        }
        self.week = 0;
        self.cost = 0.0;
        self.cost_history.clear();
        self.pipelines = Pipelines::seeded(rules.starting_throughput);
        self.waiting = RoleKind::ALL.into_iter().collect();
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Structural invariants that must hold between advances.
    pub fn check_invariants(&self) -> Result<(), DomainError> {
        for (i, participant) in self.participants.iter().enumerate() {
            if participant.role_kind().index() != i {
                return Err(invariant(format!(
                    "slot {i} holds {}",
                    participant.role_kind()
                )));
            }
            if self.week > 0 && participant.history.weeks() != self.week as usize {
                return Err(invariant(format!(
                    "{} has {} history entries at week {}",
                    participant.role_kind(),
                    participant.history.weeks(),
                    self.week
                )));
            }
        }
        let (shipping, mailing) = self.pipelines.lengths();
        if shipping.iter().any(|&len| len != SHIPPING_DELAY) {
            return Err(invariant(format!("shipping queue lengths {shipping:?}")));
        }
        if mailing.iter().any(|&len| len != MAILING_DELAY) {
            return Err(invariant(format!("mailing queue lengths {mailing:?}")));
        }
        if self.week > 0 && self.cost_history.len() != self.week as usize {
            return Err(invariant(format!(
                "cost history has {} entries at week {}",
                self.cost_history.len(),
                self.week
            )));
        }
        Ok(())
    }
}

fn invariant(detail: String) -> DomainError {
    DomainError::validation(ValidationKind::InvariantViolation, detail)
}
