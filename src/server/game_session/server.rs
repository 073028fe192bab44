use actix::prelude::*;
use actix::MessageResult;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::server::TICK_INTERVAL;
use crate::game::types::Side;
use crate::server::game_session::hub::{Effects, Hub, TimerCommand};
use crate::server::game_session::messages::{
    Connect, Disconnect, GetLobby, Intent, ProcessClientMessage, ServerEvent,
};
use crate::server::matchmaking::types::{ConnId, RoomId};
use crate::server::records::MatchRecorder;

/// Owner of every room. Its mailbox orders all joins, moves, difficulty
/// changes, disconnects, timer callbacks and ticks, so a room is never read
/// while another message is changing it. Rooms share this one mailbox
/// because no handler awaits: each message is a short synchronous step, and
/// the room map, id free list and lobby stay consistent without locks.
pub struct PongServer {
    hub: Hub,
    sessions: HashMap<ConnId, Recipient<ServerEvent>>,
    recorder: Arc<dyn MatchRecorder>,
}

impl PongServer {
    pub fn new(recorder: Arc<dyn MatchRecorder>) -> Self {
        Self::with_hub(Hub::new(), recorder)
    }

    pub fn with_hub(hub: Hub, recorder: Arc<dyn MatchRecorder>) -> Self {
        Self {
            hub,
            sessions: HashMap::new(),
            recorder,
        }
    }

    /// Carry out what the hub asked for, in order.
    fn apply(&mut self, fx: Effects, ctx: &mut Context<Self>) {
        for delivery in fx.deliveries {
            match self.sessions.get(&delivery.conn) {
                Some(addr) => addr.do_send(delivery.event),
                None => debug!("[PongServer] No session for {}, event dropped", delivery.conn),
            }
        }
        for command in fx.timers {
            match command {
                TimerCommand::Cancel(handle) => {
                    ctx.cancel_future(handle);
                }
                TimerCommand::StartAi { room_id, every } => self.start_ai_timer(room_id, every, ctx),
                TimerCommand::StartGrace { room_id, side, after } => {
                    self.start_grace_timer(room_id, side, after, ctx)
                }
            }
        }
        for result in fx.results {
            self.recorder.record(result);
        }
    }

    fn start_ai_timer(&mut self, room_id: RoomId, every: std::time::Duration, ctx: &mut Context<Self>) {
        let id = room_id.clone();
        let handle = ctx.run_interval(every, move |act, _| act.hub.refresh_ai(&id));
        if !self.hub.set_ai_timer(&room_id, handle) {
            ctx.cancel_future(handle);
        }
    }

    fn start_grace_timer(
        &mut self,
        room_id: RoomId,
        side: Side,
        after: std::time::Duration,
        ctx: &mut Context<Self>,
    ) {
        let id = room_id.clone();
        let handle = ctx.run_later(after, move |act, ctx| {
            let mut fx = Effects::new();
            act.hub.expire_grace(&id, side, &mut fx);
            act.apply(fx, ctx);
        });
        if !self.hub.set_grace_timer(&room_id, side, handle) {
            ctx.cancel_future(handle);
        }
    }
}

impl Actor for PongServer {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("[PongServer] Game loop started, one tick every {:?}", TICK_INTERVAL);
        ctx.run_interval(TICK_INTERVAL, |act, ctx| {
            let mut fx = Effects::new();
            act.hub.tick(&mut fx);
            act.apply(fx, ctx);
        });
    }
}

impl Handler<Connect> for PongServer {
    type Result = ();

    fn handle(&mut self, msg: Connect, ctx: &mut Context<Self>) -> Self::Result {
        if self.sessions.insert(msg.conn, msg.addr).is_some() {
            warn!("[PongServer] Connection id {} registered twice", msg.conn);
        }
        let mut fx = Effects::new();
        self.hub.admit(msg.conn, msg.identity, &mut fx);
        self.apply(fx, ctx);
    }
}

impl Handler<Disconnect> for PongServer {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, ctx: &mut Context<Self>) -> Self::Result {
        let mut fx = Effects::new();
        self.hub.dispatch(msg.conn, Intent::Disconnect, &mut fx);
        self.sessions.remove(&msg.conn);
        self.apply(fx, ctx);
    }
}

impl Handler<ProcessClientMessage> for PongServer {
    type Result = ();

    fn handle(&mut self, msg: ProcessClientMessage, ctx: &mut Context<Self>) -> Self::Result {
        let mut fx = Effects::new();
        self.hub.dispatch(msg.conn, Intent::Client(msg.msg), &mut fx);
        self.apply(fx, ctx);
    }
}

impl Handler<GetLobby> for PongServer {
    type Result = MessageResult<GetLobby>;

    fn handle(&mut self, _: GetLobby, _: &mut Context<Self>) -> Self::Result {
        MessageResult(self.hub.lobby())
    }
}
