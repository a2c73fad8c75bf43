//! Read-only views handed to observers and decision providers.

use serde::Serialize;

use crate::domain::participant::{History, Participant, PlayerKind};
use crate::domain::roles::{Link, RoleKind};
use crate::domain::state::{GamePhase, GroupId, GroupState};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantSnapshot {
    pub role: RoleKind,
    pub role_name: &'static str,
    pub name: Option<String>,
    pub player: PlayerKind,
    pub connected: bool,
    pub cost: f64,
    pub inventory: u32,
    pub backlog: u32,
    pub upstream: Link,
    pub downstream: Link,
    pub history: History,
}

impl From<&Participant> for ParticipantSnapshot {
    fn from(p: &Participant) -> Self {
        Self {
            role: p.role.kind,
            role_name: p.role.kind.display_name(),
            name: p.name.clone(),
            player: p.kind.clone(),
            connected: p.connection.is_some(),
            cost: p.cost,
            inventory: p.inventory,
            backlog: p.backlog,
            upstream: p.role.upstream.clone(),
            downstream: p.role.downstream.clone(),
            history: p.history.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSnapshot {
    pub group_id: GroupId,
    pub week: u32,
    pub cost: f64,
    pub cost_history: Vec<f64>,
    pub participants: Vec<ParticipantSnapshot>,
    pub waiting_for: Vec<RoleKind>,
    pub shipping: Vec<Vec<u32>>,
    pub mailing: Vec<Vec<u32>>,
}

impl From<&GroupState> for GroupSnapshot {
    fn from(g: &GroupState) -> Self {
        Self {
            group_id: g.id,
            week: g.week,
            cost: g.cost,
            cost_history: g.cost_history.clone(),
            participants: g.participants.iter().map(ParticipantSnapshot::from).collect(),
            waiting_for: g.waiting_for(),
            shipping: g.pipelines.shipping_snapshot(),
            mailing: g.pipelines.mailing_snapshot(),
        }
    }
}

/// Whole-game view, groups in rank order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSnapshot {
    pub phase: GamePhase,
    pub max_weeks: u32,
    pub user_count: usize,
    pub groups: Vec<GroupSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleResult {
    pub role: RoleKind,
    pub name: Option<String>,
    pub player: PlayerKind,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupResult {
    pub group_id: GroupId,
    pub rank: usize,
    pub week: u32,
    pub cost: f64,
    pub roles: Vec<RoleResult>,
}

impl GroupResult {
    pub fn from_state(rank: usize, g: &GroupState) -> Self {
        Self {
            group_id: g.id,
            rank,
            week: g.week,
            cost: g.cost,
            roles: g
                .participants
                .iter()
                .map(|p| RoleResult {
                    role: p.role.kind,
                    name: p.name.clone(),
                    player: p.kind.clone(),
                    cost: p.cost,
                })
                .collect(),
        }
    }
}

/// Final standings broadcast when the game ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSummary {
    /// `true` when an admin stopped the game before every group finished.
    pub ended_early: bool,
    pub max_weeks: u32,
    pub groups: Vec<GroupResult>,
}
