use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::participant::ConnectionId;
use crate::errors::domain::DomainError;
use crate::services::GameFlowService;
use crate::state::app_state::AppState;
use crate::ws::hub::{HubEvent, WsRegistry};
use crate::ws::protocol::{ClientMsg, ErrorCode, ServerMsg, PROTOCOL_VERSION};
use crate::AppError;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session = WsSession::new(
        Uuid::new_v4(),
        app_state.flow().clone(),
        app_state.websocket_registry(),
    );
    ws::start(session, &req, stream)
}

pub struct WsSession {
    conn_id: ConnectionId,
    flow: GameFlowService,
    registry: Arc<WsRegistry>,

    last_heartbeat: Instant,
    heartbeat_handle: Option<actix::SpawnHandle>,

    hello_done: bool,
}

impl WsSession {
    fn new(conn_id: ConnectionId, flow: GameFlowService, registry: Arc<WsRegistry>) -> Self {
        Self {
            conn_id,
            flow,
            registry,
            last_heartbeat: Instant::now(),
            heartbeat_handle: None,
            hello_done: false,
        }
    }

    fn send_json(ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMsg) {
        match serde_json::to_string(msg) {
            Ok(payload) => ctx.text(payload),
            Err(err) => warn!(error = %err, "[WS SESSION] failed to serialize outbound message"),
        }
    }

    fn send_error_and_close(
        &self,
        ctx: &mut ws::WebsocketContext<Self>,
        code: ErrorCode,
        message: impl Into<String>,
    ) {
        let msg = ServerMsg::Error {
            code,
            message: message.into(),
            reason: None,
        };
        Self::send_json(ctx, &msg);
        ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
        ctx.stop();
    }

    /// A refused request; the socket stays open.
    fn send_rejection(ctx: &mut ws::WebsocketContext<Self>, err: DomainError) {
        let err = AppError::from(err);
        let code = match err.code() {
            crate::errors::ErrorCode::UserNotFound => ErrorCode::NotRegistered,
            _ => ErrorCode::Rejected,
        };
        Self::send_json(
            ctx,
            &ServerMsg::Error {
                code,
                message: err.detail().to_string(),
                reason: Some(err.code().as_str()),
            },
        );
    }

    fn start_heartbeat(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let handle = ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(conn_id = %actor.conn_id, "[WS SESSION] heartbeat timed out");
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
        self.heartbeat_handle = Some(handle);
    }

    fn handle_client_msg(&mut self, cmd: ClientMsg, ctx: &mut ws::WebsocketContext<Self>) {
        if let ClientMsg::Hello { protocol } = cmd {
            if protocol != PROTOCOL_VERSION {
                self.send_error_and_close(
                    ctx,
                    ErrorCode::BadProtocol,
                    "Unsupported protocol version",
                );
                return;
            }
            self.hello_done = true;
            Self::send_json(
                ctx,
                &ServerMsg::HelloAck {
                    protocol: PROTOCOL_VERSION,
                    connection_id: self.conn_id,
                },
            );
            return;
        }

        if !self.hello_done {
            self.send_error_and_close(ctx, ErrorCode::BadRequest, "Must send hello first");
            return;
        }

        match cmd {
            ClientMsg::Hello { .. } => {}
            ClientMsg::Register { username } => {
                match self.flow.register_user(&username, self.conn_id) {
                    Ok(registration) => {
                        info!(
                            conn_id = %self.conn_id,
                            group_id = %registration.group_id,
                            role = %registration.role,
                            reconnected = registration.reconnected,
                            "[WS SESSION] registered"
                        );
                        Self::send_json(ctx, &ServerMsg::Registered { registration });
                    }
                    Err(err) => Self::send_rejection(ctx, err),
                }
            }
            ClientMsg::SubmitOrder { quantity } => {
                match self.flow.submit_order_for_connection(self.conn_id, quantity) {
                    Ok((group_id, role, outcome)) => Self::send_json(
                        ctx,
                        &ServerMsg::OrderAck {
                            group_id,
                            role,
                            outcome,
                        },
                    ),
                    Err(err) => Self::send_rejection(ctx, err),
                }
            }
            ClientMsg::WatchAdmin => {
                self.registry.watch_admin(self.conn_id);
                Self::send_json(
                    ctx,
                    &ServerMsg::AdminSnapshot {
                        game: self.flow.snapshot(),
                    },
                );
            }
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(conn_id = %self.conn_id, "[WS SESSION] started");
        self.registry
            .register_connection(self.conn_id, ctx.address().recipient::<HubEvent>());
        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.registry.unregister_connection(self.conn_id);
        self.flow.disconnect(self.conn_id);
        info!(conn_id = %self.conn_id, "[WS SESSION] stopped");
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(cmd) => self.handle_client_msg(cmd, ctx),
                    Err(_) => {
                        self.send_error_and_close(ctx, ErrorCode::BadRequest, "Malformed JSON")
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
                self.send_error_and_close(ctx, ErrorCode::BadRequest, "Binary not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {
                self.last_heartbeat = Instant::now();
            }
            Err(err) => {
                warn!(conn_id = %self.conn_id, error = %err, "[WS SESSION] protocol error");
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                ctx.stop();
            }
        }
    }
}

impl Handler<HubEvent> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: HubEvent, ctx: &mut Self::Context) -> Self::Result {
        match msg {
            HubEvent::Send(msg) => Self::send_json(ctx, &msg),
            HubEvent::Kick { group_id } => {
                info!(conn_id = %self.conn_id, group_id = %group_id, "[WS SESSION] kicked");
                Self::send_json(ctx, &ServerMsg::Kicked { group_id });
                self.registry.unregister_connection(self.conn_id);
                if let Some(handle) = self.heartbeat_handle.take() {
                    ctx.cancel_future(handle);
                }
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
            }
        }
    }
}
