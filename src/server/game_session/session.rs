use actix::{Actor, ActorContext, Addr, AsyncContext, Handler, Running, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse, http::StatusCode};
use actix_web_actors::ws;
use log::{debug, info, warn};
use serde_json::json;
use std::time::Instant;
use uuid::Uuid;

use crate::config::server::{CLIENT_TIMEOUT, HEARTBEAT_INTERVAL};
use crate::server::auth::authenticate;
use crate::server::game_session::messages::{
    ClientEvent, Connect, Disconnect, ProcessClientMessage, ServerEvent,
};
use crate::server::game_session::server::PongServer;
use crate::server::matchmaking::types::{ConnId, Identity};
use crate::server::state::AppState;
use crate::server::ws_error::{http_error_response, ws_error_message};

/// One authenticated websocket. Parses client frames into `ClientEvent`s for
/// the `PongServer` and writes back every `ServerEvent` addressed to it.
pub struct PlayerSession {
    pub conn: ConnId,
    pub identity: Identity,
    pub server: Addr<PongServer>,
    last_heartbeat: Instant,
}

impl PlayerSession {
    pub fn new(identity: Identity, server: Addr<PongServer>) -> Self {
        Self {
            conn: Uuid::new_v4(),
            identity,
            server,
            last_heartbeat: Instant::now(),
        }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > CLIENT_TIMEOUT {
                warn!("[Session] {} heartbeat timeout, disconnecting", act.conn);
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn handle_text(&self, text: &str, ctx: &mut ws::WebsocketContext<Self>) {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(msg) => self.server.do_send(ProcessClientMessage { conn: self.conn, msg }),
            Err(e) => {
                debug!("[Session] {} sent an unreadable frame: {}", self.conn, e);
                ctx.text(ws_error_message(
                    "INVALID_MESSAGE",
                    "Message could not be parsed",
                    Some(json!(e.to_string())),
                ));
            }
        }
    }
}

impl Actor for PlayerSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("[Session] {} opened for {}", self.conn, self.identity.user_id);
        self.start_heartbeat(ctx);
        self.server.do_send(Connect {
            conn: self.conn,
            identity: self.identity.clone(),
            addr: ctx.address().recipient(),
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.server.do_send(Disconnect { conn: self.conn });
        Running::Stop
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        info!("[Session] {} closed", self.conn);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for PlayerSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                self.handle_text(&text, ctx);
            }
            Ok(ws::Message::Ping(data)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&data);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Binary(_)) => {
                ctx.text(ws_error_message("INVALID_MESSAGE", "Binary frames are not supported", None));
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {}
            Err(e) => {
                warn!("[Session] {} protocol error: {}", self.conn, e);
                ctx.stop();
            }
        }
    }
}

impl Handler<ServerEvent> for PlayerSession {
    type Result = ();

    fn handle(&mut self, msg: ServerEvent, ctx: &mut Self::Context) -> Self::Result {
        match serde_json::to_string(&msg) {
            Ok(text) => ctx.text(text),
            Err(e) => warn!("[Session] Failed to serialize event for {}: {}", self.conn, e),
        }
    }
}

/// Websocket entry point. The credential is checked before the upgrade; a
/// refused connection never reaches the room layer.
pub async fn ws_game(
    req: HttpRequest,
    stream: web::Payload,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let identity = match authenticate(&req, data.verifier.as_ref()) {
        Ok(identity) => identity,
        Err(e) => {
            warn!("[Session] Connection refused: {}", e);
            return Ok(http_error_response(e.code(), &e.to_string(), None, StatusCode::UNAUTHORIZED));
        }
    };
    ws::start(PlayerSession::new(identity, data.server.clone()), &req, stream)
}
