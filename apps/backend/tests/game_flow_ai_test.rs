mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backend::ai::{DecisionError, DecisionProvider, DecisionRequest, DecisionResolver};
use backend::config::GameConfig;
use backend::domain::{AiProvider, GamePhase, PlayerKind, RoleKind};
use backend::services::{GameFlowService, NotifyEvent, SubmitOutcome};
use common::{config_with_weeks, local, recording_service, recording_service_with, seat_human_group};
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Default)]
struct AlwaysRateLimited {
    calls: AtomicU32,
}

#[async_trait]
impl DecisionProvider for AlwaysRateLimited {
    fn name(&self) -> &'static str {
        "always-rate-limited"
    }

    async fn decide(&self, _request: &DecisionRequest) -> Result<u32, DecisionError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Err(DecisionError::RateLimited { retry_after: None })
    }
}

async fn wait_until(limit: Duration, mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + limit;
    while !done() {
        assert!(Instant::now() < deadline, "condition not reached within {limit:?}");
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

fn hosted_team() -> Vec<PlayerKind> {
    vec![PlayerKind::ai(AiProvider::OpenAi, "gpt-5-mini"); 4]
}

#[tokio::test(start_paused = true)]
async fn ai_only_groups_finish_on_fallbacks_without_slowing_each_other() {
    let config = GameConfig::default();
    let timing = config.ai.clone();
    let provider = Arc::new(AlwaysRateLimited::default());
    let resolver = DecisionResolver::new(
        timing.clone(),
        config.rules.starting_throughput,
        config.max_order_quantity,
    )
    .with_provider(AiProvider::OpenAi, provider.clone());
    let max_weeks = config.rules.max_weeks;
    let (flow, notifier) = recording_service_with(config, resolver);

    let a = flow.create_team(hosted_team()).unwrap();
    let b = flow.create_team(hosted_team()).unwrap();

    let started = Instant::now();
    flow.start_game().unwrap();
    wait_until(Duration::from_secs(3600), || flow.phase() == GamePhase::Ended).await;
    let elapsed = started.elapsed();

    // Each week costs one thinking pause plus a backoff between attempts.
    let per_week =
        timing.thinking_delay + timing.default_retry_after * (timing.max_attempts - 1);
    let batches = max_weeks - 1;
    assert!(elapsed >= per_week * batches, "{elapsed:?}");
    assert!(
        elapsed <= per_week * batches + Duration::from_secs(2),
        "groups must run concurrently: {elapsed:?}"
    );

    for id in [a, b] {
        let state = flow.group_state(id).unwrap();
        assert_eq!(state.week, max_weeks);
        // Falling back to the last downstream order is the pass-through policy.
        assert_eq!(state.cost_history, common::pass_through_cost_history());
    }
    assert_eq!(
        provider.calls.load(Ordering::Relaxed),
        2 * 4 * batches * timing.max_attempts
    );
    assert_eq!(notifier.count(|e| matches!(e, NotifyEvent::GameEnded(_))), 1);
}

#[tokio::test(start_paused = true)]
async fn human_order_lands_while_the_ai_batch_is_thinking() {
    let mut config = config_with_weeks(40);
    config.ai.thinking_delay = Duration::from_secs(3);
    let (flow, notifier) = recording_service(config);
    let team = flow
        .create_team(vec![
            PlayerKind::Human,
            local("pass-through"),
            local("pass-through"),
            local("pass-through"),
        ])
        .unwrap();
    let connection = Uuid::new_v4();
    flow.register_user("hana", connection).unwrap();
    flow.start_game().unwrap();

    let (_, role, outcome) = flow.submit_order_for_connection(connection, 6).unwrap();
    assert_eq!(role, RoleKind::Retailer);
    assert_eq!(
        outcome,
        SubmitOutcome::Waiting {
            remaining: vec![RoleKind::Wholesaler, RoleKind::RegionalWarehouse, RoleKind::Factory]
        }
    );

    tokio::time::sleep(Duration::from_secs(4)).await;

    let state = flow.group_state(team).unwrap();
    assert_eq!(state.week, 2);
    assert_eq!(state.participant(RoleKind::Retailer).history.orders, vec![4, 6]);
    assert_eq!(state.participant(RoleKind::Wholesaler).history.orders, vec![4, 4]);
    let human_turns = notifier.count(|e| {
        matches!(e, NotifyEvent::NextTurn { connection: Some(c), week: 2, .. } if *c == connection)
    });
    assert_eq!(human_turns, 1);
}

#[tokio::test(start_paused = true)]
async fn reset_discards_batches_from_the_previous_run() {
    let mut config = config_with_weeks(40);
    config.ai.thinking_delay = Duration::from_secs(2);
    let (flow, _) = recording_service(config);
    let team = flow.create_team(vec![local("base-stock"); 4]).unwrap();

    flow.start_game().unwrap();
    flow.reset_game().unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let state = flow.group_state(team).unwrap();
    assert_eq!(state.week, 0);
    assert_eq!(state.waiting.len(), 4);
    assert!(state.participants.iter().all(|p| p.history.weeks() == 0));

    flow.start_game().unwrap();
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(flow.group_state(team).unwrap().week, 2);
}

#[tokio::test(start_paused = true)]
async fn stalled_human_group_does_not_hold_back_an_ai_group() {
    let mut config = config_with_weeks(5);
    config.ai.thinking_delay = Duration::ZERO;
    let (flow, _) = recording_service(config);
    let (humans, _) = seat_human_group(&flow, "p");
    let bots = flow.create_team(vec![local("pass-through"); 4]).unwrap();

    flow.start_game().unwrap();
    wait_until(Duration::from_secs(10), || {
        flow.group_state(bots).is_some_and(|s| s.week == 5)
    })
    .await;

    assert_eq!(flow.group_state(humans).unwrap().week, 1);
    assert_eq!(flow.phase(), GamePhase::Running);

    let summary = flow.end_game().unwrap();
    assert!(summary.ended_early);
    let weeks: Vec<u32> = summary.groups.iter().map(|g| g.week).collect();
    assert_eq!(weeks, vec![1, 5]);
}

#[test]
fn services_share_nothing() {
    let (one, _) = recording_service(config_with_weeks(3));
    let (two, _) = recording_service(config_with_weeks(3));
    one.create_team(vec![local("fixed"); 4]).unwrap();

    let check = |flow: &GameFlowService| flow.snapshot().groups.len();
    assert_eq!(check(&one), 1);
    assert_eq!(check(&two), 0);
}
