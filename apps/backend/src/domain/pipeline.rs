//! Weekly goods/order flow for one group.
//!
//! Shipments travel from role `i+1` down to role `i` through `shipping[i]`
//! with a two-week delay; orders travel from role `i` up to role `i+1`
//! through `mailing[i]` with a one-week delay. The factory's own orders go
//! straight into `shipping[3]` and come back as production two weeks later.

use std::collections::VecDeque;

use serde::Serialize;

use crate::domain::roles::{Role, RoleKind};
use crate::domain::rules::{GameRules, MAIL_LINKS, ROLES};
use crate::domain::state::GroupState;
use crate::errors::domain::{DomainError, ValidationKind};

pub const SHIPPING_DELAY: usize = 2;
pub const MAILING_DELAY: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pipelines {
    pub shipping: [VecDeque<u32>; ROLES],
    pub mailing: [VecDeque<u32>; MAIL_LINKS],
}

impl Pipelines {
    /// Every slot pre-filled with `throughput`.
    pub fn seeded(throughput: u32) -> Self {
        Self {
            shipping: std::array::from_fn(|_| VecDeque::from(vec![throughput; SHIPPING_DELAY])),
            mailing: std::array::from_fn(|_| VecDeque::from(vec![throughput; MAILING_DELAY])),
        }
    }

    pub fn lengths(&self) -> ([usize; ROLES], [usize; MAIL_LINKS]) {
        (
            self.shipping.each_ref().map(VecDeque::len),
            self.mailing.each_ref().map(VecDeque::len),
        )
    }

    pub fn shipping_snapshot(&self) -> Vec<Vec<u32>> {
        self.shipping.iter().map(|q| q.iter().copied().collect()).collect()
    }

    pub fn mailing_snapshot(&self) -> Vec<Vec<u32>> {
        self.mailing.iter().map(|q| q.iter().copied().collect()).collect()
    }
}

/// What one role saw and did during an advance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleStep {
    pub role: RoleKind,
    /// Units that arrived from upstream this week.
    pub received: u32,
    /// Order that arrived from downstream (customer demand for the retailer).
    pub incoming_order: u32,
    pub shipped: u32,
    /// Order placed upstream this week.
    pub placed_order: u32,
    pub inventory: u32,
    pub backlog: u32,
    pub cost: f64,
}

/// Outcome of one advance, in role order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekReport {
    /// The week that was processed (the group's week before the advance).
    pub week: u32,
    pub customer_demand: u32,
    pub steps: Vec<RoleStep>,
    pub group_cost: f64,
}

/// Advance `group` by exactly one week.
///
/// Roles are processed strictly in index order; a role's shipment to its
/// downstream neighbour is enqueued before that neighbour's next pop. The
/// group must not be mutated if this returns an error.
pub fn advance_week(group: &mut GroupState, rules: &GameRules) -> Result<WeekReport, DomainError> {
    let week = group.week;
    let throughput = rules.starting_throughput;

    if week == 0 {
        group.pipelines = Pipelines::seeded(throughput);
        group.cost_history.clear();
        for participant in &mut group.participants {
            participant.history.clear();
            participant.role = Role::fresh(participant.role.kind, throughput);
        }
    }

    let (shipping, mailing) = group.pipelines.lengths();
    if shipping.iter().any(|&len| len == 0) || mailing.iter().any(|&len| len == 0) {
        return Err(DomainError::validation(
            ValidationKind::InvariantViolation,
            format!("group {} has drained pipelines {shipping:?} {mailing:?}", group.id),
        ));
    }

    let customer_demand = rules.demand.demand_for_week(week);
    let GroupState {
        participants,
        pipelines,
        cost: group_cost,
        ..
    } = group;

    let mut steps = Vec::with_capacity(ROLES);
    for (i, participant) in participants.iter_mut().enumerate() {
        participant.history.cost.push(participant.cost);
        participant.history.inventory.push(participant.inventory);
        participant.history.backlog.push(participant.backlog);

        let received = pop(&mut pipelines.shipping[i])?;
        participant.role.upstream.shipments = received;
        participant.inventory = participant.inventory.saturating_add(received);

        let incoming_order = if i == 0 {
            customer_demand
        } else {
            pop(&mut pipelines.mailing[i - 1])?
        };
        participant.role.downstream.orders = incoming_order;

        let to_ship = participant.backlog.saturating_add(incoming_order);
        let shipped = participant.inventory.min(to_ship);
        participant.role.downstream.shipments = shipped;
        if i > 0 {
            pipelines.shipping[i - 1].push_back(shipped);
        }
        participant.backlog = to_ship - shipped;
        participant.inventory -= shipped;

        if week == 0 {
            participant.role.upstream.orders = throughput;
        }
        let placed_order = participant.role.upstream.orders;
        if i == ROLES - 1 {
            pipelines.shipping[i].push_back(placed_order);
        } else {
            pipelines.mailing[i].push_back(placed_order);
        }
        participant.history.orders.push(placed_order);

        // The group total accrues each role's cost as it stood at the start
        // of the week; this week's holding and backlog charge lands next week.
        *group_cost += participant.cost;
        participant.cost += f64::from(participant.inventory) * rules.inventory_cost
            + f64::from(participant.backlog) * rules.backlog_cost;

        steps.push(RoleStep {
            role: participant.role.kind,
            received,
            incoming_order,
            shipped,
            placed_order,
            inventory: participant.inventory,
            backlog: participant.backlog,
            cost: participant.cost,
        });
    }

    group.cost_history.push(group.cost);
    group.week += 1;
    group.waiting = RoleKind::ALL.into_iter().collect();

    Ok(WeekReport {
        week,
        customer_demand,
        steps,
        group_cost: group.cost,
    })
}

fn pop(queue: &mut VecDeque<u32>) -> Result<u32, DomainError> {
    queue.pop_front().ok_or_else(|| {
        DomainError::validation(ValidationKind::InvariantViolation, "pipeline queue drained")
    })
}
