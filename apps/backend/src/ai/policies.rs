//! In-process ordering policies.
//!
//! Deterministic, network-free decision makers used for the `local`
//! provider, the headless simulator and tests.

use async_trait::async_trait;

use super::registry;
use super::trait_def::{DecisionError, DecisionProvider, DecisionRequest};
use crate::domain::pipeline::SHIPPING_DELAY;
use crate::domain::rules::GameRules;
use crate::domain::snapshot::ParticipantSnapshot;

/// Chooses an order from a participant's own view of the chain.
pub trait OrderPolicy: Send + Sync {
    fn order(&self, participant: &ParticipantSnapshot, rules: &GameRules) -> u32;
}

/// Orders exactly what was last ordered from downstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl PassThrough {
    pub const NAME: &'static str = "pass-through";
}

impl OrderPolicy for PassThrough {
    fn order(&self, participant: &ParticipantSnapshot, _rules: &GameRules) -> u32 {
        participant.downstream.orders
    }
}

/// Always orders the starting throughput.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedThroughput;

impl FixedThroughput {
    pub const NAME: &'static str = "fixed";
}

impl OrderPolicy for FixedThroughput {
    fn order(&self, _participant: &ParticipantSnapshot, rules: &GameRules) -> u32 {
        rules.starting_throughput
    }
}

/// Order-up-to policy on inventory position.
///
/// Inventory position is net stock (inventory minus backlog) plus the most
/// recent orders still assumed in transit. The target defaults to starting
/// inventory plus one shipping delay worth of throughput, which makes the
/// policy order exactly the incoming demand in the initial steady state.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseStock {
    pub target: Option<i64>,
}

impl BaseStock {
    pub const NAME: &'static str = "base-stock";

    fn target(&self, rules: &GameRules) -> i64 {
        self.target.unwrap_or_else(|| {
            i64::from(rules.starting_inventory)
                + SHIPPING_DELAY as i64 * i64::from(rules.starting_throughput)
        })
    }
}

impl OrderPolicy for BaseStock {
    fn order(&self, participant: &ParticipantSnapshot, rules: &GameRules) -> u32 {
        let orders = &participant.history.orders;
        let on_order: i64 = orders
            .iter()
            .rev()
            .take(SHIPPING_DELAY)
            .map(|&q| i64::from(q))
            .sum();
        let net_stock = i64::from(participant.inventory) - i64::from(participant.backlog);
        let demand = i64::from(participant.downstream.orders);
        let wanted = demand + self.target(rules) - net_stock - on_order;
        u32::try_from(wanted.max(0)).unwrap_or(u32::MAX)
    }
}

/// `DecisionProvider` for `AiProvider::Local`; the model id names a policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalPolicies;

#[async_trait]
impl DecisionProvider for LocalPolicies {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn decide(&self, request: &DecisionRequest) -> Result<u32, DecisionError> {
        let factory = registry::policy_by_name(&request.model.model).ok_or_else(|| {
            DecisionError::Unavailable(format!("unknown local policy {}", request.model.model))
        })?;
        let policy = (factory.make)();
        Ok(policy.order(&request.participant, &request.rules))
    }
}
