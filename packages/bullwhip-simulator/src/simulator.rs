//! In-memory game runner.
//!
//! Drives one group through the real week transition with a local ordering
//! policy in every seat. No lobby, no notifier, no clock.

use backend::ai::OrderPolicy;
use backend::domain::snapshot::ParticipantSnapshot;
use backend::domain::{advance_week, GameRules, GroupId, GroupState, RoleKind, WeekReport, ROLES};
use backend::errors::domain::DomainError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("week transition failed: {0}")]
    Advance(#[from] DomainError),
    #[error("unknown policy {0}")]
    UnknownPolicy(String),
}

/// Result of simulating a complete game.
#[derive(Debug, Clone)]
pub struct GameResult {
    pub rules: GameRules,
    /// Group as it stands after the final week.
    pub group: GroupState,
    /// One report per advance, in order.
    pub weeks: Vec<WeekReport>,
}

impl GameResult {
    pub fn customer_demand(&self) -> Vec<u32> {
        self.weeks.iter().map(|w| w.customer_demand).collect()
    }
}

pub struct Simulator {
    rules: GameRules,
    group: GroupState,
    max_order_quantity: u32,
}

impl Simulator {
    pub fn new(rules: GameRules, game_id: u64, max_order_quantity: u32) -> Self {
        let group = GroupState::all_human(GroupId(game_id), &rules);
        Self {
            rules,
            group,
            max_order_quantity,
        }
    }

    /// Run every week of the game. Orders from a policy above the admin
    /// limit are clamped to it, matching what the live server accepts.
    pub fn simulate_game(
        mut self,
        policies: &[Box<dyn OrderPolicy>; ROLES],
    ) -> Result<GameResult, SimulatorError> {
        let max_weeks = self.rules.max_weeks;
        let mut weeks = Vec::with_capacity(max_weeks as usize);

        while self.group.week < max_weeks {
            weeks.push(advance_week(&mut self.group, &self.rules)?);
            if self.group.week >= max_weeks {
                break;
            }
            for (role, policy) in RoleKind::ALL.into_iter().zip(policies) {
                let view = ParticipantSnapshot::from(self.group.participant(role));
                let quantity = policy.order(&view, &self.rules).min(self.max_order_quantity);
                self.group.record_order(role, quantity);
            }
        }

        Ok(GameResult {
            rules: self.rules,
            group: self.group,
            weeks,
        })
    }
}

/// Shift every demand level by a uniform offset in `-jitter..=jitter`,
/// independently per level, never below zero.
pub fn jittered_rules(base: &GameRules, jitter: u32, rng: &mut StdRng) -> GameRules {
    let mut rules = base.clone();
    if jitter == 0 {
        return rules;
    }
    let span = i64::from(jitter);
    for level in &mut rules.demand.levels {
        let shifted = i64::from(*level) + rng.random_range(-span..=span);
        *level = u32::try_from(shifted.max(0)).unwrap_or(u32::MAX);
    }
    rules
}

/// Per-game generator: the same `seed` and `game_no` always give the same
/// stream.
pub fn game_rng(seed: u64, game_no: u32) -> StdRng {
    StdRng::seed_from_u64(seed ^ (u64::from(game_no) << 32))
}
