use serde::{Deserialize, Serialize};

use crate::domain::participant::ConnectionId;
use crate::domain::roles::RoleKind;
use crate::domain::snapshot::{GameSnapshot, GameSummary, GroupSnapshot, ParticipantSnapshot};
use crate::domain::state::GroupId;
use crate::services::{Registration, SubmitOutcome};

pub const PROTOCOL_VERSION: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    Hello { protocol: i32 },
    Register { username: String },
    /// Signed so negative input reaches validation instead of failing to parse.
    SubmitOrder { quantity: i64 },
    WatchAdmin,
}

#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    HelloAck {
        protocol: i32,
        connection_id: ConnectionId,
    },

    Registered {
        registration: Registration,
    },

    OrderAck {
        group_id: GroupId,
        role: RoleKind,
        outcome: SubmitOutcome,
    },

    NextTurn {
        group_id: GroupId,
        week: u32,
        participant: ParticipantSnapshot,
    },

    /// Sent once to a connection that starts watching as admin.
    AdminSnapshot {
        game: GameSnapshot,
    },

    GroupUpdated {
        rank: usize,
        group: GroupSnapshot,
    },

    GroupRemoved {
        group_id: GroupId,
    },

    OrderWait {
        group_id: GroupId,
        remaining: Vec<RoleKind>,
    },

    GameStarted,

    GameReset,

    GameEnded {
        summary: GameSummary,
    },

    Kicked {
        group_id: GroupId,
    },

    Error {
        code: ErrorCode,
        message: String,
        /// Engine error code when the request was understood but refused.
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<&'static str>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadProtocol,
    BadRequest,
    NotRegistered,
    Rejected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadProtocol => "bad_protocol",
            ErrorCode::BadRequest => "bad_request",
            ErrorCode::NotRegistered => "not_registered",
            ErrorCode::Rejected => "rejected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_use_snake_case_tags() {
        let msg: ClientMsg =
            serde_json::from_str(r#"{"type":"submit_order","quantity":-3}"#).unwrap();
        assert_eq!(msg, ClientMsg::SubmitOrder { quantity: -3 });

        let msg: ClientMsg = serde_json::from_str(r#"{"type":"watch_admin"}"#).unwrap();
        assert_eq!(msg, ClientMsg::WatchAdmin);

        let msg: ClientMsg =
            serde_json::from_str(r#"{"type":"register","username":"ana"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMsg::Register {
                username: "ana".into()
            }
        );
    }

    #[test]
    fn error_frame_omits_missing_reason() {
        let frame = ServerMsg::Error {
            code: ErrorCode::BadRequest,
            message: "Malformed JSON".into(),
            reason: None,
        };
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "error", "code": "bad_request", "message": "Malformed JSON"})
        );
        assert_eq!(ErrorCode::NotRegistered.as_str(), "not_registered");
    }

    #[test]
    fn unit_variants_serialize_as_bare_tags() {
        let value = serde_json::to_value(ServerMsg::GameReset).unwrap();
        assert_eq!(value, serde_json::json!({"type": "game_reset"}));
    }
}
