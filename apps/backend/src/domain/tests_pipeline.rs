use crate::domain::pipeline::{advance_week, MAILING_DELAY, SHIPPING_DELAY};
use crate::domain::roles::RoleKind;
use crate::domain::rules::{GameRules, ROLES};
use crate::domain::test_helpers::{fresh_group, order_pass_through, play_pass_through};
use crate::errors::domain::ValidationKind;

#[test]
fn week_zero_keeps_starting_inventory() {
    let rules = GameRules::default();
    let mut group = fresh_group(&rules);

    let report = advance_week(&mut group, &rules).unwrap();

    assert_eq!(report.week, 0);
    assert_eq!(report.customer_demand, 4);
    assert_eq!(group.week, 1);
    for step in &report.steps {
        assert_eq!(step.received, 4, "{}", step.role);
        assert_eq!(step.shipped, 4, "{}", step.role);
        assert_eq!(step.placed_order, 4, "{}", step.role);
    }
    for p in &group.participants {
        assert_eq!(p.inventory, 12);
        assert_eq!(p.backlog, 0);
        assert_eq!(p.cost, 6.0);
        assert_eq!(p.history.inventory, vec![12]);
        assert_eq!(p.history.orders, vec![4]);
    }
    // The group total lags one week behind the participants' running costs.
    assert_eq!(group.cost, 0.0);
    assert_eq!(group.cost_history, vec![0.0]);
    assert_eq!(group.waiting.len(), ROLES);
}

#[test]
fn week_zero_ignores_recorded_orders() {
    let rules = GameRules::default();
    let mut group = fresh_group(&rules);
    group.record_order(RoleKind::Factory, 50);

    let report = advance_week(&mut group, &rules).unwrap();

    assert_eq!(report.steps[3].placed_order, rules.starting_throughput);
}

#[test]
fn retailer_sees_demand_schedule() {
    let rules = GameRules::default();
    let mut group = fresh_group(&rules);
    let mut seen = Vec::new();
    for _ in 0..rules.max_weeks {
        let report = advance_week(&mut group, &rules).unwrap();
        assert_eq!(report.steps[0].incoming_order, report.customer_demand);
        seen.push(report.customer_demand);
        order_pass_through(&mut group);
    }
    for (week, expected) in [(7, 4), (8, 8), (18, 8), (19, 12), (38, 16), (39, 20)] {
        assert_eq!(seen[week], expected, "week {week}");
    }
}

#[test]
fn queue_lengths_survive_every_advance() {
    let rules = GameRules::default();
    let mut group = fresh_group(&rules);
    for _ in 0..rules.max_weeks {
        advance_week(&mut group, &rules).unwrap();
        let (shipping, mailing) = group.pipelines.lengths();
        assert_eq!(shipping, [SHIPPING_DELAY; ROLES]);
        assert_eq!(mailing, [MAILING_DELAY; ROLES - 1]);
        group.check_invariants().unwrap();
        order_pass_through(&mut group);
    }
}

#[test]
fn shipment_reaches_downstream_two_weeks_later() {
    let rules = GameRules::default();
    let mut group = fresh_group(&rules);
    advance_week(&mut group, &rules).unwrap();

    // Give the wholesaler a backlog to clear so its week-1 shipment stands out.
    let wholesaler = group.participant_mut(RoleKind::Wholesaler);
    wholesaler.inventory = 20;
    wholesaler.backlog = 10;
    order_pass_through(&mut group);
    let week1 = advance_week(&mut group, &rules).unwrap();
    assert_eq!(week1.steps[1].shipped, 14);

    order_pass_through(&mut group);
    let week2 = advance_week(&mut group, &rules).unwrap();
    assert_eq!(week2.steps[0].received, 4);

    order_pass_through(&mut group);
    let week3 = advance_week(&mut group, &rules).unwrap();
    assert_eq!(week3.steps[0].received, 14);
}

#[test]
fn factory_orders_feed_its_own_shipping_queue() {
    let rules = GameRules::default();
    let mut group = fresh_group(&rules);
    advance_week(&mut group, &rules).unwrap();
    order_pass_through(&mut group);
    group.record_order(RoleKind::Factory, 9);

    advance_week(&mut group, &rules).unwrap();

    assert_eq!(group.pipelines.shipping[3].back(), Some(&9));
}

#[test]
fn drained_pipeline_is_rejected_without_mutation() {
    let rules = GameRules::default();
    let mut group = fresh_group(&rules);
    advance_week(&mut group, &rules).unwrap();
    group.pipelines.mailing[1].clear();
    let before = group.participants.clone();

    let err = advance_week(&mut group, &rules).unwrap_err();

    assert_eq!(err.validation_kind(), Some(&ValidationKind::InvariantViolation));
    assert_eq!(group.week, 1);
    assert_eq!(group.participants, before);
}

#[test]
fn pass_through_full_game_matches_golden_costs() {
    let rules = GameRules::default();
    let mut group = fresh_group(&rules);

    play_pass_through(&mut group, &rules, rules.max_weeks);

    let expected: Vec<f64> = [
        0, 24, 72, 144, 240, 360, 504, 672, 864, 1078, 1312, 1562, 1830, 2112, 2410, 2720, 3048,
        3392, 3756, 4140, 4552, 4996, 5480, 6012, 6604, 7268, 8020, 8880, 9868, 11004, 12308,
        13800, 15500, 17428, 19604, 22044, 24760, 27764, 31064, 34668,
    ]
    .into_iter()
    .map(f64::from)
    .collect();
    assert_eq!(group.cost_history, expected);
    assert_eq!(group.cost, 34668.0);
    assert_eq!(group.week, 40);

    let finals: Vec<(f64, u32, u32)> = group
        .participants
        .iter()
        .map(|p| (p.cost, p.inventory, p.backlog))
        .collect();
    assert_eq!(
        finals,
        vec![(1618.0, 0, 132), (1190.0, 0, 96), (766.0, 0, 60), (342.0, 0, 24)]
    );
}

#[test]
fn reset_then_replay_is_identical() {
    let rules = GameRules::default();
    let mut group = fresh_group(&rules);
    play_pass_through(&mut group, &rules, 15);
    let first = group.cost_history.clone();

    group.reset(&rules);
    play_pass_through(&mut group, &rules, 15);

    assert_eq!(group.cost_history, first);
    assert_eq!(group.epoch, 1);
}
