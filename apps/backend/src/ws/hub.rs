use actix::prelude::*;
use dashmap::{DashMap, DashSet};
use tracing::debug;

use crate::domain::participant::ConnectionId;
use crate::domain::state::GroupId;
use crate::ws::protocol::ServerMsg;

#[derive(Message, Clone)]
#[rtype(result = "()")]
pub enum HubEvent {
    Send(ServerMsg),
    /// The connection's group was removed; the session closes after telling the client.
    Kick { group_id: GroupId },
}

/// Live websocket sessions keyed by connection id.
///
/// Delivery uses `do_send`, which never waits, so the registry can be called
/// from engine code holding a group lock.
#[derive(Default)]
pub struct WsRegistry {
    connections: DashMap<ConnectionId, Recipient<HubEvent>>,
    admins: DashSet<ConnectionId>,
}

impl WsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_connection(&self, connection: ConnectionId, recipient: Recipient<HubEvent>) {
        self.connections.insert(connection, recipient);
    }

    pub fn unregister_connection(&self, connection: ConnectionId) {
        self.connections.remove(&connection);
        self.admins.remove(&connection);
    }

    pub fn watch_admin(&self, connection: ConnectionId) {
        self.admins.insert(connection);
    }

    pub fn active_connections_count(&self) -> usize {
        self.connections.len()
    }

    pub fn admin_count(&self) -> usize {
        self.admins.len()
    }

    /// Returns `false` when the connection is not (or no longer) registered.
    pub fn send_to(&self, connection: ConnectionId, event: HubEvent) -> bool {
        let recipient = self
            .connections
            .get(&connection)
            .map(|entry| entry.value().clone());
        match recipient {
            Some(recipient) => {
                recipient.do_send(event);
                true
            }
            None => {
                debug!(conn_id = %connection, "[WS HUB] dropped event for unknown connection");
                false
            }
        }
    }

    pub fn broadcast_all(&self, msg: &ServerMsg) {
        for recipient in self.recipients(|_| true) {
            recipient.do_send(HubEvent::Send(msg.clone()));
        }
    }

    pub fn broadcast_admins(&self, msg: &ServerMsg) {
        for recipient in self.recipients(|id| self.admins.contains(id)) {
            recipient.do_send(HubEvent::Send(msg.clone()));
        }
    }

    /// Admin watchers plus the group's own `members`, each at most once.
    pub fn broadcast_group(&self, members: &[ConnectionId], msg: &ServerMsg) {
        for recipient in self.recipients(|id| self.admins.contains(id) || members.contains(id)) {
            recipient.do_send(HubEvent::Send(msg.clone()));
        }
    }

    // Clones recipients out so no shard lock is held while sending.
    fn recipients(&self, keep: impl Fn(&ConnectionId) -> bool) -> Vec<Recipient<HubEvent>> {
        self.connections
            .iter()
            .filter(|entry| keep(entry.key()))
            .map(|entry| entry.value().clone())
            .collect()
    }
}
