use crate::domain::pipeline::advance_week;
use crate::domain::roles::RoleKind;
use crate::domain::rules::GameRules;
use crate::domain::state::{GroupId, GroupState};

pub fn fresh_group(rules: &GameRules) -> GroupState {
    GroupState::all_human(GroupId(1), rules)
}

/// Every role orders what it was just asked for.
pub fn order_pass_through(group: &mut GroupState) {
    for role in RoleKind::ALL {
        let incoming = group.participant(role).role.downstream.orders;
        group.record_order(role, incoming);
    }
}

/// Runs `weeks` advances with the pass-through policy between them.
pub fn play_pass_through(group: &mut GroupState, rules: &GameRules, weeks: u32) {
    for _ in 0..weeks {
        advance_week(group, rules).unwrap();
        order_pass_through(group);
    }
}
