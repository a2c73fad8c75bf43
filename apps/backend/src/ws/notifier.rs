use std::sync::Arc;

use crate::domain::participant::ConnectionId;
use crate::domain::roles::RoleKind;
use crate::domain::snapshot::{GameSummary, GroupSnapshot, ParticipantSnapshot};
use crate::domain::state::GroupId;
use crate::services::Notifier;
use crate::ws::hub::{HubEvent, WsRegistry};
use crate::ws::protocol::ServerMsg;

/// Routes engine events to websocket sessions.
///
/// Per-participant turns go to the seated connection. Group-level views go
/// to admin watchers and the group's members. Lifecycle events go to everyone.
pub struct WsNotifier {
    registry: Arc<WsRegistry>,
}

impl WsNotifier {
    pub fn new(registry: Arc<WsRegistry>) -> Self {
        Self { registry }
    }
}

impl Notifier for WsNotifier {
    fn next_turn(
        &self,
        connection: Option<ConnectionId>,
        group_id: GroupId,
        week: u32,
        participant: &ParticipantSnapshot,
    ) {
        let Some(connection) = connection else {
            return;
        };
        self.registry.send_to(
            connection,
            HubEvent::Send(ServerMsg::NextTurn {
                group_id,
                week,
                participant: participant.clone(),
            }),
        );
    }

    fn group_updated(&self, rank: usize, group: &GroupSnapshot, members: &[ConnectionId]) {
        self.registry.broadcast_group(
            members,
            &ServerMsg::GroupUpdated {
                rank,
                group: group.clone(),
            },
        );
    }

    fn order_wait_updated(&self, group_id: GroupId, remaining: &[RoleKind], members: &[ConnectionId]) {
        self.registry.broadcast_group(
            members,
            &ServerMsg::OrderWait {
                group_id,
                remaining: remaining.to_vec(),
            },
        );
    }

    fn game_started(&self) {
        self.registry.broadcast_all(&ServerMsg::GameStarted);
    }

    fn game_reset(&self) {
        self.registry.broadcast_all(&ServerMsg::GameReset);
    }

    fn game_ended(&self, summary: &GameSummary) {
        self.registry.broadcast_all(&ServerMsg::GameEnded {
            summary: summary.clone(),
        });
    }

    fn group_removed(&self, group_id: GroupId, kicked: &[ConnectionId]) {
        for &connection in kicked {
            self.registry.send_to(connection, HubEvent::Kick { group_id });
        }
        self.registry
            .broadcast_admins(&ServerMsg::GroupRemoved { group_id });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix::prelude::*;
    use parking_lot::Mutex;
    use uuid::Uuid;

    use super::*;
    use crate::domain::rules::GameRules;
    use crate::domain::state::GroupState;

    /// Records the `type` tag of every frame it would have sent.
    struct Sink(Arc<Mutex<Vec<String>>>);

    impl Actor for Sink {
        type Context = Context<Self>;
    }

    impl Handler<HubEvent> for Sink {
        type Result = ();

        fn handle(&mut self, event: HubEvent, _: &mut Self::Context) {
            let tag = match event {
                HubEvent::Send(msg) => serde_json::to_value(&msg)
                    .ok()
                    .and_then(|v| v["type"].as_str().map(str::to_owned))
                    .unwrap_or_default(),
                HubEvent::Kick { group_id } => format!("kick:{group_id}"),
            };
            self.0.lock().push(tag);
        }
    }

    fn connect(registry: &WsRegistry) -> (ConnectionId, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let addr = Sink(Arc::clone(&seen)).start();
        let id = Uuid::new_v4();
        registry.register_connection(id, addr.recipient());
        (id, seen)
    }

    async fn settle() {
        actix_web::rt::time::sleep(Duration::from_millis(20)).await;
    }

    #[actix_web::test]
    async fn events_reach_the_right_audience() {
        let registry = Arc::new(WsRegistry::new());
        let notifier = WsNotifier::new(Arc::clone(&registry));
        let (player, player_seen) = connect(&registry);
        let (_, outsider_seen) = connect(&registry);
        let (admin, admin_seen) = connect(&registry);
        registry.watch_admin(admin);

        let group = GroupState::all_human(GroupId(3), &GameRules::default());
        let snapshot = GroupSnapshot::from(&group);
        let participant = snapshot.participants[0].clone();

        notifier.next_turn(Some(player), GroupId(3), 1, &participant);
        notifier.next_turn(None, GroupId(3), 1, &participant);
        notifier.group_updated(0, &snapshot, &[player]);
        notifier.order_wait_updated(GroupId(3), &[RoleKind::Factory], &[player, admin]);
        notifier.game_started();
        notifier.group_removed(GroupId(3), &[player]);
        settle().await;

        assert_eq!(
            *player_seen.lock(),
            vec!["next_turn", "group_updated", "order_wait", "game_started", "kick:3"]
        );
        assert_eq!(*outsider_seen.lock(), vec!["game_started"]);
        assert_eq!(
            *admin_seen.lock(),
            vec!["group_updated", "order_wait", "game_started", "group_removed"]
        );
    }

    #[actix_web::test]
    async fn unregistered_connections_are_skipped() {
        let registry = Arc::new(WsRegistry::new());
        let (gone, seen) = connect(&registry);
        registry.watch_admin(gone);
        registry.unregister_connection(gone);

        assert!(!registry.send_to(gone, HubEvent::Send(ServerMsg::GameReset)));
        assert_eq!(registry.active_connections_count(), 0);
        assert_eq!(registry.admin_count(), 0);
        settle().await;
        assert!(seen.lock().is_empty());
    }
}
