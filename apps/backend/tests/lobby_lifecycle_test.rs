mod common;

use std::sync::Arc;

use backend::domain::snapshot::{GameSummary, GroupSnapshot, ParticipantSnapshot};
use backend::domain::{ConnectionId, GamePhase, GroupId, PlayerKind, RoleKind};
use backend::errors::domain::{ConflictKind, DomainError, ValidationKind};
use backend::services::{GameFlowService, Notifier, NotifyEvent, RecordingNotifier};
use common::{config_with_weeks, local, recording_service, seat_human_group, service_with_notifier};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use uuid::Uuid;

fn kind_of(err: &DomainError) -> Option<&ValidationKind> {
    err.validation_kind()
}

#[test]
fn new_names_fill_open_slots_in_rank_order() {
    let (flow, _) = recording_service(config_with_weeks(40));
    let mixed = flow
        .create_team(vec![
            local("pass-through"),
            PlayerKind::Human,
            local("base-stock"),
            PlayerKind::Human,
        ])
        .unwrap();

    let a = flow.register_user("ana", Uuid::new_v4()).unwrap();
    let b = flow.register_user("ben", Uuid::new_v4()).unwrap();
    let c = flow.register_user("cai", Uuid::new_v4()).unwrap();

    assert_eq!((a.group_id, a.role), (mixed, RoleKind::Wholesaler));
    assert_eq!((b.group_id, b.role), (mixed, RoleKind::Factory));
    assert_ne!(c.group_id, mixed, "full teams spill into a new group");
    assert_eq!(c.role, RoleKind::Retailer);
    assert!(!c.reconnected);

    let snapshot = flow.snapshot();
    assert_eq!(snapshot.user_count, 3);
    assert_eq!(snapshot.groups.len(), 2);
    assert_eq!(snapshot.groups[0].group_id, mixed);
}

#[test]
fn ai_slots_are_named_at_creation() {
    let (flow, _) = recording_service(config_with_weeks(40));
    let id = flow
        .create_team(vec![local("pass-through"); 4])
        .unwrap();
    let state = flow.group_state(id).unwrap();
    assert_eq!(
        state.participant(RoleKind::Factory).name.as_deref(),
        Some("AI-pass-through-Factory")
    );
    assert!(state.is_fully_seated());
}

#[test]
fn usernames_are_validated_and_reconnect() {
    let (flow, _) = recording_service(config_with_weeks(40));
    let err = flow.register_user("   ", Uuid::new_v4()).unwrap_err();
    assert_eq!(kind_of(&err), Some(&ValidationKind::InvalidUsername));
    let err = flow.register_user(&"x".repeat(33), Uuid::new_v4()).unwrap_err();
    assert_eq!(kind_of(&err), Some(&ValidationKind::InvalidUsername));

    let first = Uuid::new_v4();
    let seat = flow.register_user(" dana ", first).unwrap();

    let err = flow.register_user("dana", Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, DomainError::Conflict(ConflictKind::UsernameInUse, _)));

    flow.disconnect(first);
    let again = flow.register_user("dana", Uuid::new_v4()).unwrap();
    assert!(again.reconnected);
    assert_eq!((again.group_id, again.role), (seat.group_id, seat.role));
}

#[test]
fn late_names_are_refused_but_known_names_reconnect() {
    let (flow, _) = recording_service(config_with_weeks(40));
    let (group, connections) = seat_human_group(&flow, "p");
    flow.start_game().unwrap();

    let err = flow.register_user("latecomer", Uuid::new_v4()).unwrap_err();
    assert_eq!(kind_of(&err), Some(&ValidationKind::PhaseMismatch));

    flow.disconnect(connections[1]);
    let back = flow.register_user("p-1", Uuid::new_v4()).unwrap();
    assert!(back.reconnected);
    assert_eq!(back.group_id, group);
    assert_eq!(back.week, 1);
    assert_eq!(back.phase, GamePhase::Running);
}

#[test]
fn team_definitions_are_validated() {
    let (flow, _) = recording_service(config_with_weeks(40));

    let err = flow.create_team(vec![PlayerKind::Human; 3]).unwrap_err();
    assert_eq!(kind_of(&err), Some(&ValidationKind::InvalidTeam));

    let err = flow
        .create_team(vec![
            local("pass-through"),
            local("pass-through"),
            local("telepathy"),
            local("pass-through"),
        ])
        .unwrap_err();
    assert_eq!(kind_of(&err), Some(&ValidationKind::InvalidTeam));

    assert!(flow.group_ids().is_empty());
}

#[test]
fn start_requires_complete_connected_teams() {
    let (flow, notifier) = recording_service(config_with_weeks(40));
    let err = flow.start_game().unwrap_err();
    assert_eq!(kind_of(&err), Some(&ValidationKind::NoTeams));

    let (_, connections) = seat_human_group(&flow, "p");
    flow.create_team(vec![
        PlayerKind::Human,
        local("pass-through"),
        local("pass-through"),
        local("pass-through"),
    ])
    .unwrap();
    let err = flow.start_game().unwrap_err();
    assert_eq!(kind_of(&err), Some(&ValidationKind::IncompleteTeam));

    flow.register_user("solo", Uuid::new_v4()).unwrap();
    flow.disconnect(connections[0]);
    let err = flow.start_game().unwrap_err();
    assert_eq!(kind_of(&err), Some(&ValidationKind::IncompleteTeam));
    assert_eq!(flow.phase(), GamePhase::Lobby);
    assert_eq!(notifier.count(|e| matches!(e, NotifyEvent::GameStarted)), 0);
}

#[test]
fn lifecycle_transitions_are_guarded() {
    let (flow, notifier) = recording_service(config_with_weeks(40));
    let (group, _) = seat_human_group(&flow, "p");

    let err = flow.reset_game().unwrap_err();
    assert_eq!(kind_of(&err), Some(&ValidationKind::PhaseMismatch));
    let err = flow.end_game().unwrap_err();
    assert_eq!(kind_of(&err), Some(&ValidationKind::PhaseMismatch));

    flow.start_game().unwrap();
    let err = flow.start_game().unwrap_err();
    assert!(matches!(err, DomainError::Conflict(ConflictKind::AlreadyStarted, _)));
    let err = flow.create_team(vec![PlayerKind::Human; 4]).unwrap_err();
    assert_eq!(kind_of(&err), Some(&ValidationKind::PhaseMismatch));

    let summary = flow.end_game().unwrap();
    assert!(summary.ended_early);
    assert_eq!(summary.groups[0].group_id, group);
    let err = flow.end_game().unwrap_err();
    assert_eq!(kind_of(&err), Some(&ValidationKind::PhaseMismatch));
    assert_eq!(notifier.count(|e| matches!(e, NotifyEvent::GameEnded(_))), 1);
}

#[test]
fn reset_returns_to_week_zero_and_keeps_seats() {
    let (flow, notifier) = recording_service(config_with_weeks(40));
    let (group, _) = seat_human_group(&flow, "p");
    flow.start_game().unwrap();
    for role in RoleKind::ALL {
        flow.submit_order(group, role, 7).unwrap();
    }
    assert_eq!(flow.group_state(group).unwrap().week, 2);

    flow.reset_game().unwrap();

    assert_eq!(flow.phase(), GamePhase::Lobby);
    let state = flow.group_state(group).unwrap();
    assert_eq!(state.week, 0);
    assert_eq!(state.cost, 0.0);
    assert_eq!(state.epoch, 1);
    assert!(state.participants.iter().all(|p| p.history.weeks() == 0));
    assert_eq!(state.participant(RoleKind::Wholesaler).name.as_deref(), Some("p-1"));
    assert_eq!(notifier.count(|e| matches!(e, NotifyEvent::GameReset)), 1);

    // Same seats can play again straight away.
    flow.start_game().unwrap();
    assert_eq!(flow.group_state(group).unwrap().week, 1);
}

#[test]
fn removing_a_group_keeps_other_ids_and_shifts_ranks() {
    let (flow, notifier) = recording_service(config_with_weeks(40));
    let (first, connections) = seat_human_group(&flow, "a");
    let (second, _) = seat_human_group(&flow, "b");
    notifier.take();

    flow.remove_group(first).unwrap();

    assert_eq!(flow.group_ids(), vec![second]);
    assert!(flow.group_state(first).is_none());
    assert_eq!(flow.snapshot().user_count, 4);
    let kicked = notifier.events().into_iter().find_map(|e| match e {
        NotifyEvent::GroupRemoved { group_id, kicked } => Some((group_id, kicked)),
        _ => None,
    });
    let (removed, mut kicked) = kicked.expect("group_removed event");
    assert_eq!(removed, first);
    kicked.sort();
    let mut expected = connections.to_vec();
    expected.sort();
    assert_eq!(kicked, expected);

    // The freed names can be registered again.
    let again = flow.register_user("a-0", Uuid::new_v4()).unwrap();
    assert!(!again.reconnected);
    assert!(again.group_id > second);

    assert!(matches!(
        flow.remove_group(GroupId(first.0)).unwrap_err(),
        DomainError::NotFound(..)
    ));
}

#[test]
fn removing_the_last_unfinished_group_ends_the_game() {
    let (flow, notifier) = recording_service(config_with_weeks(2));
    let (done, _) = seat_human_group(&flow, "a");
    let (stuck, _) = seat_human_group(&flow, "b");
    flow.start_game().unwrap();
    for role in RoleKind::ALL {
        flow.submit_order(done, role, 4).unwrap();
    }
    assert_eq!(flow.phase(), GamePhase::Running);

    flow.remove_group(stuck).unwrap();

    assert_eq!(flow.phase(), GamePhase::Ended);
    assert_eq!(notifier.count(|e| matches!(e, NotifyEvent::GameEnded(_))), 1);
}

#[test]
fn removing_every_group_of_a_running_game_ends_it_early() {
    let (flow, notifier) = recording_service(config_with_weeks(40));
    let (only, _) = seat_human_group(&flow, "a");
    flow.start_game().unwrap();

    flow.remove_group(only).unwrap();

    assert_eq!(flow.phase(), GamePhase::Ended);
    let summaries: Vec<GameSummary> = notifier
        .events()
        .into_iter()
        .filter_map(|e| match e {
            NotifyEvent::GameEnded(summary) => Some(summary),
            _ => None,
        })
        .collect();
    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].ended_early);
    assert!(summaries[0].groups.is_empty());
}

#[test]
fn removing_the_last_group_in_the_lobby_keeps_the_lobby() {
    let (flow, _) = recording_service(config_with_weeks(40));
    let (only, _) = seat_human_group(&flow, "a");
    flow.remove_group(only).unwrap();
    assert_eq!(flow.phase(), GamePhase::Lobby);
}

#[test]
fn group_views_reach_seated_members_only() {
    let (flow, notifier) = recording_service(config_with_weeks(40));
    let (group, connections) = seat_human_group(&flow, "p");
    flow.start_game().unwrap();
    notifier.take();

    flow.submit_order(group, RoleKind::Retailer, 5).unwrap();
    let members = notifier.events().into_iter().find_map(|e| match e {
        NotifyEvent::OrderWait { remaining, members, .. } => Some((remaining, members)),
        _ => None,
    });
    let (remaining, mut members) = members.expect("order_wait event");
    assert_eq!(remaining.len(), 3);
    members.sort();
    let mut expected = connections.to_vec();
    expected.sort();
    assert_eq!(members, expected);

    notifier.take();
    flow.disconnect(connections[2]);
    let members = notifier.events().into_iter().find_map(|e| match e {
        NotifyEvent::GroupUpdated { members, .. } => Some(members),
        _ => None,
    });
    let members = members.expect("group_updated event");
    assert_eq!(members.len(), 3);
    assert!(!members.contains(&connections[2]));
}

/// Submits an order for every seat of its group as soon as the game
/// announces its start, the way an eager client reacts to `game_started`.
#[derive(Default)]
struct EagerTeam {
    target: OnceCell<(GameFlowService, GroupId)>,
    replies: Mutex<Vec<Option<ValidationKind>>>,
    recorded: RecordingNotifier,
}

impl Notifier for EagerTeam {
    fn next_turn(&self, connection: Option<ConnectionId>, group_id: GroupId, week: u32, participant: &ParticipantSnapshot) {
        self.recorded.next_turn(connection, group_id, week, participant);
    }

    fn group_updated(&self, rank: usize, group: &GroupSnapshot, members: &[ConnectionId]) {
        self.recorded.group_updated(rank, group, members);
    }

    fn order_wait_updated(&self, group_id: GroupId, remaining: &[RoleKind], members: &[ConnectionId]) {
        self.recorded.order_wait_updated(group_id, remaining, members);
    }

    fn game_started(&self) {
        self.recorded.game_started();
        let Some((flow, group)) = self.target.get() else {
            return;
        };
        for role in RoleKind::ALL {
            let reply = flow.submit_order(*group, role, 9);
            self.replies
                .lock()
                .push(reply.err().and_then(|err| err.validation_kind().cloned()));
        }
    }

    fn game_reset(&self) {
        self.recorded.game_reset();
    }

    fn game_ended(&self, summary: &GameSummary) {
        self.recorded.game_ended(summary);
    }

    fn group_removed(&self, group_id: GroupId, kicked: &[ConnectionId]) {
        self.recorded.group_removed(group_id, kicked);
    }
}

#[test]
fn orders_sent_on_game_started_wait_for_week_one() {
    let eager = Arc::new(EagerTeam::default());
    let flow = service_with_notifier(config_with_weeks(40), Arc::clone(&eager) as Arc<dyn Notifier>);
    let (group, _) = seat_human_group(&flow, "p");
    assert!(eager.target.set((flow.clone(), group)).is_ok());

    flow.start_game().unwrap();

    assert_eq!(
        *eager.replies.lock(),
        vec![Some(ValidationKind::PhaseMismatch); 4]
    );
    let state = flow.group_state(group).unwrap();
    assert_eq!(state.week, 1, "start advances each group exactly once");
    assert_eq!(state.participant(RoleKind::Retailer).history.orders, vec![4]);
    assert_eq!(state.waiting_for().len(), 4);

    for role in RoleKind::ALL {
        flow.submit_order(group, role, 9).unwrap();
    }
    let state = flow.group_state(group).unwrap();
    assert_eq!(state.week, 2);
    assert_eq!(state.participant(RoleKind::Retailer).history.orders, vec![4, 9]);
}
