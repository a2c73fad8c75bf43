#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use backend::ai::DecisionResolver;
use backend::config::{AiTiming, GameConfig};
use backend::domain::{AiProvider, ConnectionId, GroupId, PlayerKind, RoleKind};
use backend::services::{GameFlowService, Notifier, RecordingNotifier};
use uuid::Uuid;

// Logging is auto-installed for every test binary
#[ctor::ctor]
fn init_logging() {
    backend_test_support::test_logging::init();
}

/// Golden group cost history for a 40-week game where every role orders
/// exactly what it was asked for.
pub const PASS_THROUGH_COST_HISTORY: [u32; 40] = [
    0, 24, 72, 144, 240, 360, 504, 672, 864, 1078, 1312, 1562, 1830, 2112, 2410, 2720, 3048, 3392,
    3756, 4140, 4552, 4996, 5480, 6012, 6604, 7268, 8020, 8880, 9868, 11004, 12308, 13800, 15500,
    17428, 19604, 22044, 24760, 27764, 31064, 34668,
];

pub fn pass_through_cost_history() -> Vec<f64> {
    PASS_THROUGH_COST_HISTORY.into_iter().map(f64::from).collect()
}

pub fn config_with_weeks(max_weeks: u32) -> GameConfig {
    let mut config = GameConfig::default();
    config.rules.max_weeks = max_weeks;
    config
}

fn local_resolver(config: &GameConfig) -> DecisionResolver {
    DecisionResolver::new(
        config.ai.clone(),
        config.rules.starting_throughput,
        config.max_order_quantity,
    )
}

/// Service wired to a recording notifier and the local policies only.
pub fn recording_service(config: GameConfig) -> (GameFlowService, Arc<RecordingNotifier>) {
    let resolver = local_resolver(&config);
    recording_service_with(config, resolver)
}

/// Local policies only, with a caller-supplied notifier.
pub fn service_with_notifier(config: GameConfig, notifier: Arc<dyn Notifier>) -> GameFlowService {
    let resolver = local_resolver(&config);
    GameFlowService::new(config, resolver, notifier)
}

pub fn recording_service_with(
    config: GameConfig,
    resolver: DecisionResolver,
) -> (GameFlowService, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let flow = GameFlowService::new(config, resolver, Arc::clone(&notifier) as Arc<dyn Notifier>);
    (flow, notifier)
}

pub fn fast_timing() -> AiTiming {
    AiTiming {
        thinking_delay: Duration::ZERO,
        ..AiTiming::default()
    }
}

pub fn local(policy: &str) -> PlayerKind {
    PlayerKind::ai(AiProvider::Local, policy)
}

/// Registers four fresh users, filling one all-human group.
pub fn seat_human_group(flow: &GameFlowService, prefix: &str) -> (GroupId, [ConnectionId; 4]) {
    let connections: [ConnectionId; 4] = std::array::from_fn(|_| Uuid::new_v4());
    let mut group = None;
    for (i, &connection) in connections.iter().enumerate() {
        let registration = flow
            .register_user(&format!("{prefix}-{i}"), connection)
            .expect("register user");
        assert_eq!(registration.role, RoleKind::ALL[i]);
        group = Some(registration.group_id);
    }
    (group.expect("at least one registration"), connections)
}
