//! Protocol handler.
//!
//! `Hub` owns the room store and the session registry and turns every intent
//! into `Effects`: events to deliver, timers to start or cancel, and finished
//! matches to record. It never touches a transport or a timer itself, so the
//! whole protocol runs without an actor system in tests.

use actix::SpawnHandle;
use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;
use uuid::Uuid;

use crate::config::server::RECONNECT_GRACE;
use crate::game::state::{GameState, StepOutcome};
use crate::game::types::{Difficulty, Side};
use crate::server::game_session::messages::{
    Challenge, ClientEvent, GameEnded, GameUpdate, Intent, JoinMode, JoinRequest, PlayerAssignment,
    RoomStatus, RoomStatusKind, ServerEvent, SetDifficulty,
};
use crate::server::game_session::registry::SessionRegistry;
use crate::server::matchmaking::lobby::lobby_entries;
use crate::server::matchmaking::room::Room;
use crate::server::matchmaking::store::RoomStore;
use crate::server::matchmaking::types::{ConnId, Identity, LobbyEntry, RoomId};
use crate::server::records::{now_ms, MatchResult};

/// One outbound event for one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub conn: ConnId,
    pub event: ServerEvent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimerCommand {
    /// Start the AI target refresh of a room.
    StartAi { room_id: RoomId, every: Duration },
    /// Vacate a disconnected slot unless its owner comes back in time.
    StartGrace { room_id: RoomId, side: Side, after: Duration },
    Cancel(SpawnHandle),
}

/// Side effects of one hub call, applied in order by the caller.
#[derive(Debug, Default)]
pub struct Effects {
    pub deliveries: Vec<Delivery>,
    pub timers: Vec<TimerCommand>,
    pub results: Vec<MatchResult>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, conn: ConnId, event: ServerEvent) {
        self.deliveries.push(Delivery { conn, event });
    }

    pub fn send_all(&mut self, conns: impl IntoIterator<Item = ConnId>, event: ServerEvent) {
        for conn in conns {
            self.send(conn, event.clone());
        }
    }

    fn cancel(&mut self, handle: Option<SpawnHandle>) {
        if let Some(handle) = handle {
            self.timers.push(TimerCommand::Cancel(handle));
        }
    }
}

pub struct Hub {
    rooms: RoomStore,
    sessions: SessionRegistry,
    rng: StdRng,
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl Hub {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rooms: RoomStore::new(),
            sessions: SessionRegistry::new(),
            rng,
        }
    }

    pub fn rooms(&self) -> &RoomStore {
        &self.rooms
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn lobby(&self) -> Vec<LobbyEntry> {
        lobby_entries(&self.rooms)
    }

    /// Register a verified connection and hand it the current lobby.
    pub fn admit(&mut self, conn: ConnId, identity: Identity, fx: &mut Effects) {
        info!("[Hub] {} ({}) admitted as {}", identity.username, identity.user_id, conn);
        self.sessions.register(conn, identity);
        fx.send(conn, ServerEvent::LobbyUpdate(self.lobby()));
    }

    pub fn dispatch(&mut self, conn: ConnId, intent: Intent, fx: &mut Effects) {
        let event = match intent {
            Intent::Disconnect => return self.disconnect(conn, fx),
            Intent::Client(event) => event,
        };
        if self.sessions.get(&conn).is_none() {
            debug!("[Hub] Event from unknown connection {} dropped", conn);
            return;
        }
        match event {
            ClientEvent::JoinRoom(request) => self.join(conn, request, fx),
            ClientEvent::PaddleMove(mv) => self.paddle_move(conn, mv.y),
            ClientEvent::SetDifficulty(request) => self.set_difficulty(conn, request, fx),
            ClientEvent::LeaveRoom => self.leave(conn, fx),
            ClientEvent::Ping => {}
        }
    }

    // ---- join ----

    fn join(&mut self, conn: ConnId, request: JoinRequest, fx: &mut Effects) {
        let Some(identity) = self.sessions.identity(&conn).cloned() else {
            return;
        };
        if let Some(challenge) = request.challenge {
            return self.join_challenge(conn, identity, request.room_id, challenge, fx);
        }
        if !request.explicit_join {
            fx.send(conn, ServerEvent::ChooseOpponent);
            return;
        }
        let mode = request.options.mode;
        let target = match request.room_id {
            Some(id) => Some(id),
            None if mode == JoinMode::Ai => None,
            None => self.rooms.find_joinable(true),
        };
        self.enter_room(conn, identity, target, mode, fx);
    }

    fn enter_room(
        &mut self,
        conn: ConnId,
        identity: Identity,
        target: Option<RoomId>,
        mode: JoinMode,
        fx: &mut Effects,
    ) {
        if let Some(room_id) = &target {
            if let Some(room) = self.rooms.get(room_id) {
                if let Some(side) = room.side_of(&identity.user_id) {
                    self.leave_other_room(conn, room_id, fx);
                    self.rebind(conn, room_id, side, fx);
                    return;
                }
                if room.is_full() || room.game.game_ended {
                    debug!("[Hub] {} refused, {} is full", identity.user_id, room_id);
                    fx.send(conn, room_full(room, "Room is full"));
                    return;
                }
            }
            self.leave_other_room(conn, room_id, fx);
        } else {
            self.leave(conn, fx);
        }

        let room = self.rooms.allocate_room(target.as_deref());
        let Some(side) = room.first_open_side() else {
            fx.send(conn, room_full(room, "Room is full"));
            return;
        };
        let fresh = room.player_count() == 0;
        room.seat(side, identity.clone(), Some(conn));
        if fresh && mode == JoinMode::Ai {
            room.enable_ai();
        }
        let room_id = room.id.clone();
        info!("[Hub] {} joined {} as {}", identity.user_id, room_id, side);
        fx.send(conn, assignment(room, side));
        self.sessions.assign(&conn, &room_id, side);

        if !self.try_start(&room_id, fx) {
            fx.send(conn, ServerEvent::waiting("Waiting for an opponent..."));
        }
        self.broadcast_lobby(fx);
    }

    fn join_challenge(
        &mut self,
        conn: ConnId,
        identity: Identity,
        room_id: Option<RoomId>,
        challenge: Challenge,
        fx: &mut Effects,
    ) {
        let room_id = room_id.unwrap_or_else(|| format!("challenge-{}", Uuid::new_v4()));
        if self.rooms.contains(&room_id) {
            return self.enter_room(conn, identity, Some(room_id), JoinMode::None, fx);
        }
        self.leave(conn, fx);

        let room = self.rooms.allocate_room(Some(&room_id));
        room.challenge = true;
        room.seat(Side::Player1, identity.clone(), Some(conn));
        let waiting_for = match challenge.opponent_id {
            Some(opponent_id) => {
                let username = challenge.opponent_name.unwrap_or_else(|| opponent_id.clone());
                let notice = format!("Waiting for {} to join...", username);
                room.reserve(Side::Player2, Identity { user_id: opponent_id, username });
                Some(notice)
            }
            None => {
                room.enable_ai();
                None
            }
        };
        info!("[Hub] Challenge room {} created by {}", room_id, identity.user_id);
        fx.send(conn, assignment(room, Side::Player1));
        self.sessions.assign(&conn, &room_id, Side::Player1);

        if !self.try_start(&room_id, fx) {
            let notice = waiting_for.unwrap_or_else(|| "Waiting for an opponent...".to_string());
            fx.send(conn, ServerEvent::waiting(notice));
        }
        self.broadcast_lobby(fx);
    }

    /// Put `conn` back on a slot its identity already holds.
    fn rebind(&mut self, conn: ConnId, room_id: &str, side: Side, fx: &mut Effects) {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        let Some(slot) = room.slot_mut(side) else {
            return;
        };
        let previous = slot.conn.replace(conn);
        let returning = slot.disconnected && !slot.reserved;
        slot.disconnected = false;
        slot.reserved = false;
        fx.cancel(slot.grace_timer.take());

        if let Some(previous) = previous.filter(|previous| *previous != conn) {
            info!("[Hub] {} takes over {} side {} from {}", conn, room_id, side, previous);
            self.sessions.release_from(&previous, room_id);
        }
        self.sessions.assign(&conn, room_id, side);

        fx.send(conn, ServerEvent::CheckRoomStatus(RoomStatus {
            room_id: room_id.to_string(),
            status: RoomStatusKind::UpdateRoom,
            message: "Reconnected to room".to_string(),
            is_player1: side.is_player1(),
            ai_enabled: room.ai_enabled,
        }));
        if returning {
            info!("[Hub] {} side {} reconnected", room_id, side);
            fx.send_all(room.other_conns(side), ServerEvent::opponent_reconnected("Your opponent is back"));
        }
        let ended = room.game.game_ended;
        if !self.try_start(room_id, fx) && !ended {
            fx.send(conn, ServerEvent::waiting("Waiting for an opponent..."));
        }
        self.broadcast_lobby(fx);
    }

    /// Mark the room ready once its start condition holds. False while the
    /// room keeps waiting.
    fn try_start(&mut self, room_id: &str, fx: &mut Effects) -> bool {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return false;
        };
        if !room.can_start() {
            return false;
        }
        if !room.ready {
            room.ready = true;
            if room.ai_enabled && room.ai_timer.is_none() {
                fx.timers.push(TimerCommand::StartAi {
                    room_id: room.id.clone(),
                    every: room.ai.profile().refresh_rate,
                });
            }
            info!("[Hub] Game in {} is starting", room.id);
            fx.send_all(room.connected_conns(), ServerEvent::ready("Game is starting!"));
        }
        true
    }

    // ---- in-game intents ----

    fn paddle_move(&mut self, conn: ConnId, y: f32) {
        if !y.is_finite() {
            debug!("[Hub] Non-finite paddle position from {} ignored", conn);
            return;
        }
        let Some((room_id, side)) = self.sessions.seat(&conn) else {
            debug!("[Hub] Paddle move from unseated {} ignored", conn);
            return;
        };
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return;
        };
        if room.game.game_ended || room.slot(side).and_then(|slot| slot.conn) != Some(conn) {
            return;
        }
        room.game.set_paddle_y(side, y);
    }

    fn set_difficulty(&mut self, conn: ConnId, request: SetDifficulty, fx: &mut Effects) {
        let level: Difficulty = match request.level.parse() {
            Ok(level) => level,
            Err(e) => {
                debug!("[Hub] {} from {} ignored", e, conn);
                return;
            }
        };
        let Some((seated, _)) = self.sessions.seat(&conn) else {
            debug!("[Hub] Difficulty change from unseated {} ignored", conn);
            return;
        };
        let room_id = request.room_id.unwrap_or_else(|| seated.clone());
        if room_id != seated {
            debug!("[Hub] {} is not a member of {}", conn, room_id);
            return;
        }
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return;
        };
        room.ai.difficulty = level;
        info!("[Hub] {} difficulty set to {:?}", room_id, level);
        if room.ai_enabled && room.ready && !room.game.game_ended {
            fx.cancel(room.ai_timer.take());
            fx.timers.push(TimerCommand::StartAi {
                room_id: room_id.clone(),
                every: level.profile().refresh_rate,
            });
        }
    }

    // ---- leaving ----

    /// Vacate the caller's slot right away.
    fn leave(&mut self, conn: ConnId, fx: &mut Effects) {
        let Some((room_id, side)) = self.sessions.unassign(&conn) else {
            return;
        };
        let owns_slot = self
            .rooms
            .get(&room_id)
            .and_then(|room| room.slot(side))
            .is_some_and(|slot| slot.conn == Some(conn));
        if !owns_slot {
            return;
        }
        info!("[Hub] {} left {}", conn, room_id);
        self.vacate_seat(&room_id, side, "Your opponent left the room", fx);
    }

    fn leave_other_room(&mut self, conn: ConnId, target: &str, fx: &mut Effects) {
        if self.sessions.seat(&conn).is_some_and(|(current, _)| current != target) {
            self.leave(conn, fx);
        }
    }

    /// Remove the holder of `side`, pause and reset the room for its next
    /// opponent, and destroy it when nobody is left.
    fn vacate_seat(&mut self, room_id: &str, side: Side, notice: &str, fx: &mut Effects) {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        if let Some(slot) = room.vacate(side) {
            fx.cancel(slot.grace_timer);
        }
        pause(room, fx);
        if !room.game.game_ended && !room.challenge {
            room.game = GameState::new();
        }
        if room.is_abandoned() {
            self.teardown(room_id, fx);
            return;
        }
        let others = room.other_conns(side);
        fx.send_all(others.iter().copied(), ServerEvent::opponent_disconnected(notice));
        if !room.game.game_ended {
            fx.send_all(others, ServerEvent::waiting("Waiting for an opponent..."));
        }
        self.broadcast_lobby(fx);
    }

    /// Transport closed. The slot is kept for the grace period; an ended
    /// game has nothing to come back to and is left right away.
    fn disconnect(&mut self, conn: ConnId, fx: &mut Effects) {
        let Some(connection) = self.sessions.remove(&conn) else {
            return;
        };
        info!("[Hub] {} ({}) disconnected", conn, connection.identity.user_id);
        let Some((room_id, side)) = connection.seat else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return;
        };
        let Some(slot) = room.slot_mut(side) else {
            return;
        };
        if slot.conn != Some(conn) {
            return;
        }
        slot.conn = None;
        slot.disconnected = true;

        if room.game.game_ended {
            self.vacate_seat(&room_id, side, "Your opponent left the room", fx);
            return;
        }
        pause(room, fx);
        fx.timers.push(TimerCommand::StartGrace {
            room_id: room_id.clone(),
            side,
            after: RECONNECT_GRACE,
        });
        fx.send_all(
            room.other_conns(side),
            ServerEvent::opponent_disconnected("Your opponent disconnected, waiting for reconnection..."),
        );
    }

    /// Grace timer of a disconnected slot fired.
    pub fn expire_grace(&mut self, room_id: &str, side: Side, fx: &mut Effects) {
        let expired = self
            .rooms
            .get(room_id)
            .and_then(|room| room.slot(side))
            .is_some_and(|slot| slot.disconnected && !slot.reserved && slot.conn.is_none());
        if !expired {
            return;
        }
        if let Some(slot) = self.rooms.get_mut(room_id).and_then(|room| room.slot_mut(side)) {
            slot.grace_timer = None;
        }
        info!("[Hub] Grace period of {} side {} expired", room_id, side);
        self.vacate_seat(room_id, side, "Your opponent did not come back", fx);
    }

    // ---- scheduling ----

    /// One game-loop period over every running room.
    pub fn tick(&mut self, fx: &mut Effects) {
        let mut ended = Vec::new();
        for room in self.rooms.iter_mut() {
            if !room.ready || room.game.game_ended {
                continue;
            }
            if room.ai_enabled {
                room.ai.drive(&mut room.game);
            }
            let outcome = room.game.step(&mut self.rng);
            fx.send_all(
                room.connected_conns(),
                ServerEvent::GameUpdate(GameUpdate { room_id: room.id.clone(), state: room.game.clone() }),
            );
            match outcome {
                StepOutcome::Continue => {}
                StepOutcome::Scored(side) => debug!("[Hub] {} point for {}", room.id, side),
                StepOutcome::Ended(_) => ended.push(room.id.clone()),
            }
        }
        for room_id in ended {
            self.finish_game(&room_id, fx);
        }
    }

    /// AI target refresh timer of a room fired.
    pub fn refresh_ai(&mut self, room_id: &str) {
        if let Some(room) = self.rooms.get_mut(room_id) {
            if room.ai_enabled && room.ready && !room.game.game_ended {
                room.ai.refresh_target(&room.game, &mut self.rng);
            }
        }
    }

    /// Store a freshly started AI timer. False when the room no longer wants
    /// it, in which case the caller cancels the handle.
    pub fn set_ai_timer(&mut self, room_id: &str, handle: SpawnHandle) -> bool {
        match self.rooms.get_mut(room_id) {
            Some(room) if room.ai_enabled && room.ready && !room.game.game_ended => {
                room.ai_timer = Some(handle);
                true
            }
            _ => false,
        }
    }

    /// Store a freshly started grace timer. False when the slot was
    /// reclaimed or vacated meanwhile.
    pub fn set_grace_timer(&mut self, room_id: &str, side: Side, handle: SpawnHandle) -> bool {
        match self.rooms.get_mut(room_id).and_then(|room| room.slot_mut(side)) {
            Some(slot) if slot.disconnected && !slot.reserved && slot.conn.is_none() => {
                slot.grace_timer = Some(handle);
                true
            }
            _ => false,
        }
    }

    fn finish_game(&mut self, room_id: &str, fx: &mut Effects) {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        room.ready = false;
        fx.cancel(room.ai_timer.take());

        let final_score = room.game.final_score();
        let winner = room.game.winner().map(|side| room.participant(side));
        fx.results.push(MatchResult {
            room_id: room.id.clone(),
            player1: room.participant(Side::Player1),
            player2: room.participant(Side::Player2),
            score1: final_score.player1,
            score2: final_score.player2,
            winner: winner.clone(),
            ai_difficulty: room.ai_enabled.then_some(room.ai.difficulty),
            finished_at_ms: now_ms(),
        });
        info!(
            "[Hub] Game in {} ended {}-{}, winner {}",
            room.id,
            final_score.player1,
            final_score.player2,
            winner.as_deref().unwrap_or("none")
        );
        fx.send_all(
            room.connected_conns(),
            ServerEvent::GameEnded(GameEnded { room_id: room.id.clone(), winner, final_score }),
        );
        if !room.challenge {
            self.teardown(room_id, fx);
        }
    }

    /// Remove a room together with its timers and seat bindings, then
    /// publish the new lobby.
    fn teardown(&mut self, room_id: &str, fx: &mut Effects) {
        let Some(mut room) = self.rooms.release_room(room_id) else {
            return;
        };
        for handle in room.take_timers() {
            fx.timers.push(TimerCommand::Cancel(handle));
        }
        for conn in room.connected_conns() {
            self.sessions.release_from(&conn, room_id);
        }
        info!("[Hub] Room {} destroyed", room_id);
        self.broadcast_lobby(fx);
    }

    fn broadcast_lobby(&self, fx: &mut Effects) {
        let entries = self.lobby();
        fx.send_all(self.sessions.ids().copied(), ServerEvent::LobbyUpdate(entries));
    }
}

/// Stop ticking a room until its start condition holds again.
fn pause(room: &mut Room, fx: &mut Effects) {
    room.ready = false;
    fx.cancel(room.ai_timer.take());
}

fn assignment(room: &Room, side: Side) -> ServerEvent {
    let message = match (side, room.ai_enabled) {
        (Side::Player1, true) => "You are Player 1, playing against the AI",
        (Side::Player1, false) => "You are Player 1",
        (Side::Player2, _) => "You are Player 2",
    };
    ServerEvent::PlayerAssignment(PlayerAssignment {
        is_player1: side.is_player1(),
        room_id: room.id.clone(),
        players_in_room: room.player_count(),
        message: message.to_string(),
        ai_enabled: room.ai_enabled,
    })
}

fn room_full(room: &Room, message: &str) -> ServerEvent {
    ServerEvent::CheckRoomStatus(RoomStatus {
        room_id: room.id.clone(),
        status: RoomStatusKind::RoomFull,
        message: message.to_string(),
        is_player1: false,
        ai_enabled: room.ai_enabled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::game::{BALL_SPEED_X, COURT_HEIGHT, COURT_WIDTH, PADDLE_HEIGHT};
    use crate::server::game_session::messages::{JoinOptions, PaddleMove};

    fn hub() -> Hub {
        Hub::with_rng(StdRng::seed_from_u64(3))
    }

    fn connect(hub: &mut Hub, user: &str) -> ConnId {
        let conn = Uuid::new_v4();
        let mut fx = Effects::new();
        hub.admit(conn, Identity { user_id: user.to_string(), username: user.to_string() }, &mut fx);
        conn
    }

    fn send(hub: &mut Hub, conn: ConnId, event: ClientEvent) -> Effects {
        let mut fx = Effects::new();
        hub.dispatch(conn, Intent::Client(event), &mut fx);
        fx
    }

    fn join(room_id: Option<&str>, mode: JoinMode) -> ClientEvent {
        ClientEvent::JoinRoom(JoinRequest {
            room_id: room_id.map(str::to_string),
            explicit_join: true,
            options: JoinOptions { mode },
            challenge: None,
        })
    }

    fn to(fx: &Effects, conn: ConnId) -> Vec<&ServerEvent> {
        fx.deliveries.iter().filter(|d| d.conn == conn).map(|d| &d.event).collect()
    }

    fn lobbies(fx: &Effects) -> Vec<&Vec<LobbyEntry>> {
        fx.deliveries
            .iter()
            .filter_map(|d| match &d.event {
                ServerEvent::LobbyUpdate(entries) => Some(entries),
                _ => None,
            })
            .collect()
    }

    fn disconnect(hub: &mut Hub, conn: ConnId) -> Effects {
        let mut fx = Effects::new();
        hub.dispatch(conn, Intent::Disconnect, &mut fx);
        fx
    }

    /// Two humans in room-1, game running.
    fn pvp_room(hub: &mut Hub) -> (ConnId, ConnId) {
        let alice = connect(hub, "alice");
        let bob = connect(hub, "bob");
        send(hub, alice, join(None, JoinMode::Pvp));
        send(hub, bob, join(None, JoinMode::Pvp));
        (alice, bob)
    }

    #[test]
    fn test_admission_sends_lobby() {
        let mut hub = hub();
        let mut fx = Effects::new();
        let conn = Uuid::new_v4();
        hub.admit(conn, Identity { user_id: "1".into(), username: "alice".into() }, &mut fx);
        assert_eq!(to(&fx, conn), vec![&ServerEvent::LobbyUpdate(vec![])]);
    }

    #[test]
    fn test_join_without_explicit_flag_prompts_choice() {
        let mut hub = hub();
        let alice = connect(&mut hub, "alice");
        let fx = send(&mut hub, alice, ClientEvent::JoinRoom(JoinRequest::default()));
        assert_eq!(to(&fx, alice), vec![&ServerEvent::ChooseOpponent]);
        assert!(hub.rooms().is_empty());
    }

    #[test]
    fn test_ai_join_starts_immediately() {
        let mut hub = hub();
        let alice = connect(&mut hub, "alice");
        let fx = send(&mut hub, alice, join(None, JoinMode::Ai));

        let events = to(&fx, alice);
        assert!(matches!(events[0], ServerEvent::PlayerAssignment(a) if a.is_player1 && a.ai_enabled && a.players_in_room == 1));
        assert!(matches!(events[1], ServerEvent::GameReady(_)));
        assert_eq!(
            fx.timers,
            vec![TimerCommand::StartAi { room_id: "room-1".to_string(), every: Difficulty::Medium.profile().refresh_rate }]
        );
        let room = hub.rooms().get("room-1").unwrap();
        assert!(room.ready && room.ai_enabled);
        assert_eq!(room.ai.side, Side::Player2);
    }

    #[test]
    fn test_pvp_waits_then_starts() {
        let mut hub = hub();
        let alice = connect(&mut hub, "alice");
        let bob = connect(&mut hub, "bob");

        let fx = send(&mut hub, alice, join(None, JoinMode::Pvp));
        assert!(to(&fx, alice).iter().any(|e| matches!(e, ServerEvent::WaitingForPlayer(_))));
        assert!(!hub.rooms().get("room-1").unwrap().ready);
        // Bob sees the new room in the lobby.
        assert!(to(&fx, bob).contains(&&ServerEvent::LobbyUpdate(vec![LobbyEntry {
            room_id: "room-1".to_string(),
            player_count: 1,
        }])));

        let fx = send(&mut hub, bob, join(None, JoinMode::Pvp));
        assert!(matches!(to(&fx, bob)[0], ServerEvent::PlayerAssignment(a) if !a.is_player1 && a.players_in_room == 2));
        assert!(to(&fx, alice).iter().any(|e| matches!(e, ServerEvent::GameReady(_))));
        assert!(to(&fx, bob).iter().any(|e| matches!(e, ServerEvent::GameReady(_))));
        assert!(fx.timers.is_empty());
        assert!(hub.rooms().get("room-1").unwrap().ready);
    }

    #[test]
    fn test_full_room_reports_without_change() {
        let mut hub = hub();
        pvp_room(&mut hub);
        let carol = connect(&mut hub, "carol");

        let fx = send(&mut hub, carol, join(Some("room-1"), JoinMode::None));
        assert_eq!(fx.deliveries.len(), 1);
        assert!(matches!(to(&fx, carol)[0], ServerEvent::CheckRoomStatus(s) if s.status == RoomStatusKind::RoomFull));
        assert_eq!(hub.rooms().get("room-1").unwrap().player_count(), 2);
        assert_eq!(hub.sessions().seat(&carol), None);
    }

    #[test]
    fn test_ai_room_refuses_second_human() {
        let mut hub = hub();
        let alice = connect(&mut hub, "alice");
        let bob = connect(&mut hub, "bob");
        send(&mut hub, alice, join(None, JoinMode::Ai));

        let fx = send(&mut hub, bob, join(Some("room-1"), JoinMode::Pvp));
        assert!(matches!(to(&fx, bob)[0], ServerEvent::CheckRoomStatus(s) if s.status == RoomStatusKind::RoomFull && s.ai_enabled));

        // Anonymous PvP matchmaking skips the AI room.
        send(&mut hub, bob, join(None, JoinMode::Pvp));
        assert_eq!(hub.sessions().seat(&bob), Some(("room-2".to_string(), Side::Player1)));
    }

    #[test]
    fn test_rejoin_is_idempotent() {
        let mut hub = hub();
        let (alice, _) = pvp_room(&mut hub);

        let fx = send(&mut hub, alice, join(Some("room-1"), JoinMode::None));
        assert!(matches!(
            to(&fx, alice)[0],
            ServerEvent::CheckRoomStatus(s) if s.status == RoomStatusKind::UpdateRoom && s.is_player1
        ));
        let room = hub.rooms().get("room-1").unwrap();
        assert_eq!(room.player_count(), 2);
        assert_eq!(room.side_of("alice"), Some(Side::Player1));
        assert_eq!(hub.sessions().seat(&alice), Some(("room-1".to_string(), Side::Player1)));
    }

    #[test]
    fn test_paddle_move_is_clamped() {
        let mut hub = hub();
        let (alice, bob) = pvp_room(&mut hub);

        send(&mut hub, alice, ClientEvent::PaddleMove(PaddleMove { y: -50.0 }));
        send(&mut hub, bob, ClientEvent::PaddleMove(PaddleMove { y: 10_000.0 }));
        let game = &hub.rooms().get("room-1").unwrap().game;
        assert_eq!(game.player1.y, 0.0);
        assert_eq!(game.player2.y, COURT_HEIGHT - PADDLE_HEIGHT);

        send(&mut hub, alice, ClientEvent::PaddleMove(PaddleMove { y: f32::NAN }));
        assert_eq!(hub.rooms().get("room-1").unwrap().game.player1.y, 0.0);
    }

    #[test]
    fn test_orphan_events_are_ignored() {
        let mut hub = hub();
        let loner = connect(&mut hub, "loner");
        let fx = send(&mut hub, loner, ClientEvent::PaddleMove(PaddleMove { y: 10.0 }));
        assert!(fx.deliveries.is_empty());

        let (alice, _) = pvp_room(&mut hub);
        let fx = send(
            &mut hub,
            alice,
            ClientEvent::SetDifficulty(SetDifficulty { level: "hard".into(), room_id: Some("room-9".into()) }),
        );
        assert!(fx.deliveries.is_empty() && fx.timers.is_empty());
        assert_eq!(hub.rooms().get("room-1").unwrap().ai.difficulty, Difficulty::Medium);
    }

    #[test]
    fn test_invalid_difficulty_is_ignored() {
        let mut hub = hub();
        let alice = connect(&mut hub, "alice");
        send(&mut hub, alice, join(None, JoinMode::Ai));

        let fx = send(&mut hub, alice, ClientEvent::SetDifficulty(SetDifficulty { level: "insane".into(), room_id: None }));
        assert!(fx.deliveries.is_empty() && fx.timers.is_empty());
        assert_eq!(hub.rooms().get("room-1").unwrap().ai.difficulty, Difficulty::Medium);
    }

    #[test]
    fn test_difficulty_change_restarts_refresh() {
        let mut hub = hub();
        let alice = connect(&mut hub, "alice");
        send(&mut hub, alice, join(None, JoinMode::Ai));
        let old = SpawnHandle::default().next();
        assert!(hub.set_ai_timer("room-1", old));

        let fx = send(
            &mut hub,
            alice,
            ClientEvent::SetDifficulty(SetDifficulty { level: "hard".into(), room_id: Some("room-1".into()) }),
        );
        assert_eq!(
            fx.timers,
            vec![
                TimerCommand::Cancel(old),
                TimerCommand::StartAi { room_id: "room-1".to_string(), every: Difficulty::Hard.profile().refresh_rate },
            ]
        );
        assert_eq!(hub.rooms().get("room-1").unwrap().ai.difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_both_leaving_destroys_room_and_recycles_id() {
        let mut hub = hub();
        let (alice, bob) = pvp_room(&mut hub);
        let dave = connect(&mut hub, "dave");
        send(&mut hub, dave, join(None, JoinMode::Ai));
        assert!(hub.rooms().contains("room-2"));

        let fx = send(&mut hub, alice, ClientEvent::LeaveRoom);
        assert!(to(&fx, bob).iter().any(|e| matches!(e, ServerEvent::OpponentDisconnected(_))));
        assert_eq!(hub.rooms().get("room-1").unwrap().player_count(), 1);

        let fx = send(&mut hub, bob, ClientEvent::LeaveRoom);
        assert!(!hub.rooms().contains("room-1"));
        let last = lobbies(&fx).pop().unwrap();
        assert!(last.iter().all(|entry| entry.room_id != "room-1"));

        let carol = connect(&mut hub, "carol");
        send(&mut hub, carol, join(None, JoinMode::Ai));
        assert_eq!(hub.sessions().seat(&carol), Some(("room-1".to_string(), Side::Player1)));
    }

    #[test]
    fn test_leave_resets_unfinished_game() {
        let mut hub = hub();
        let (alice, bob) = pvp_room(&mut hub);
        hub.rooms.get_mut("room-1").unwrap().game.player1.score = 3;

        send(&mut hub, bob, ClientEvent::LeaveRoom);
        let room = hub.rooms().get("room-1").unwrap();
        assert!(!room.ready);
        assert_eq!(room.game, GameState::new());
        assert_eq!(hub.sessions().seat(&alice), Some(("room-1".to_string(), Side::Player1)));
    }

    #[test]
    fn test_disconnect_keeps_slot_for_grace_period() {
        let mut hub = hub();
        let (alice, bob) = pvp_room(&mut hub);

        let fx = disconnect(&mut hub, alice);
        assert_eq!(
            fx.timers,
            vec![TimerCommand::StartGrace { room_id: "room-1".to_string(), side: Side::Player1, after: RECONNECT_GRACE }]
        );
        assert!(to(&fx, bob).iter().any(|e| matches!(e, ServerEvent::OpponentDisconnected(_))));
        assert!(lobbies(&fx).is_empty());
        let room = hub.rooms().get("room-1").unwrap();
        assert!(!room.ready);
        assert_eq!(room.player_count(), 2);
        assert!(room.slot(Side::Player1).unwrap().disconnected);
    }

    #[test]
    fn test_reconnect_within_grace_resumes() {
        let mut hub = hub();
        let (alice, bob) = pvp_room(&mut hub);
        disconnect(&mut hub, alice);
        let grace = SpawnHandle::default().next();
        assert!(hub.set_grace_timer("room-1", Side::Player1, grace));

        let alice_again = connect(&mut hub, "alice");
        let fx = send(&mut hub, alice_again, join(Some("room-1"), JoinMode::None));
        assert_eq!(fx.timers, vec![TimerCommand::Cancel(grace)]);
        assert!(to(&fx, bob).iter().any(|e| matches!(e, ServerEvent::OpponentReconnected(_))));
        assert!(to(&fx, bob).iter().any(|e| matches!(e, ServerEvent::GameReady(_))));
        let room = hub.rooms().get("room-1").unwrap();
        assert!(room.ready);
        assert_eq!(room.slot(Side::Player1).unwrap().conn, Some(alice_again));
    }

    #[test]
    fn test_grace_expiry_tears_down_when_last_slot_goes() {
        let mut hub = hub();
        let (alice, bob) = pvp_room(&mut hub);
        disconnect(&mut hub, alice);
        disconnect(&mut hub, bob);
        let watcher = connect(&mut hub, "watcher");

        let mut fx = Effects::new();
        hub.expire_grace("room-1", Side::Player1, &mut fx);
        assert_eq!(hub.rooms().get("room-1").unwrap().player_count(), 1);

        let mut fx = Effects::new();
        hub.expire_grace("room-1", Side::Player2, &mut fx);
        assert!(hub.rooms().is_empty());
        assert_eq!(to(&fx, watcher), vec![&ServerEvent::LobbyUpdate(vec![])]);
    }

    #[test]
    fn test_stale_grace_expiry_is_ignored() {
        let mut hub = hub();
        let (alice, _) = pvp_room(&mut hub);
        disconnect(&mut hub, alice);
        let alice_again = connect(&mut hub, "alice");
        send(&mut hub, alice_again, join(Some("room-1"), JoinMode::None));

        let mut fx = Effects::new();
        hub.expire_grace("room-1", Side::Player1, &mut fx);
        assert!(fx.deliveries.is_empty());
        assert_eq!(hub.rooms().get("room-1").unwrap().player_count(), 2);
    }

    #[test]
    fn test_tick_updates_members_without_lobby() {
        let mut hub = hub();
        let (alice, bob) = pvp_room(&mut hub);
        let idle = connect(&mut hub, "idle");

        let mut fx = Effects::new();
        hub.tick(&mut fx);
        assert!(lobbies(&fx).is_empty());
        assert!(to(&fx, idle).is_empty());
        assert!(matches!(to(&fx, alice)[0], ServerEvent::GameUpdate(u) if u.room_id == "room-1"));
        assert_eq!(to(&fx, bob).len(), 1);
    }

    #[test]
    fn test_waiting_room_does_not_tick() {
        let mut hub = hub();
        let alice = connect(&mut hub, "alice");
        send(&mut hub, alice, join(None, JoinMode::Pvp));
        let before = hub.rooms().get("room-1").unwrap().game.clone();

        let mut fx = Effects::new();
        hub.tick(&mut fx);
        assert!(fx.deliveries.is_empty());
        assert_eq!(hub.rooms().get("room-1").unwrap().game, before);
    }

    #[test]
    fn test_game_end_records_and_tears_down() {
        let mut hub = hub();
        let (alice, bob) = pvp_room(&mut hub);
        {
            let game = &mut hub.rooms.get_mut("room-1").unwrap().game;
            game.player1.score = 4;
            game.player2.score = 2;
            game.ball.x = COURT_WIDTH - 2.0;
            game.ball.y = 20.0;
            game.ball.dx = BALL_SPEED_X;
            game.ball.dy = 0.0;
            game.player2.y = COURT_HEIGHT - PADDLE_HEIGHT;
        }

        let mut fx = Effects::new();
        hub.tick(&mut fx);
        assert_eq!(fx.results.len(), 1);
        let result = &fx.results[0];
        assert_eq!((result.score1, result.score2), (5, 2));
        assert_eq!(result.winner.as_deref(), Some("alice"));
        assert_eq!(result.player2, "bob");
        assert_eq!(result.ai_difficulty, None);
        assert!(to(&fx, bob).iter().any(|e| matches!(e, ServerEvent::GameEnded(g) if g.winner.as_deref() == Some("alice"))));
        assert!(!hub.rooms().contains("room-1"));
        assert_eq!(hub.sessions().seat(&alice), None);
    }

    #[test]
    fn test_challenge_reserves_opponent() {
        let mut hub = hub();
        let alice = connect(&mut hub, "alice");
        let fx = send(
            &mut hub,
            alice,
            ClientEvent::JoinRoom(JoinRequest {
                room_id: Some("duel-1".into()),
                explicit_join: true,
                options: JoinOptions::default(),
                challenge: Some(Challenge { opponent_id: Some("bob".into()), opponent_name: Some("Bob".into()) }),
            }),
        );
        assert!(to(&fx, alice).iter().any(|e| matches!(e, ServerEvent::WaitingForPlayer(n) if n.message.contains("Bob"))));
        let room = hub.rooms().get("duel-1").unwrap();
        assert!(room.challenge && !room.ready);
        assert_eq!(room.player_count(), 2);

        let carol = connect(&mut hub, "carol");
        let fx = send(&mut hub, carol, join(Some("duel-1"), JoinMode::None));
        assert!(matches!(to(&fx, carol)[0], ServerEvent::CheckRoomStatus(s) if s.status == RoomStatusKind::RoomFull));

        let bob = connect(&mut hub, "bob");
        let fx = send(&mut hub, bob, join(Some("duel-1"), JoinMode::None));
        assert!(matches!(to(&fx, bob)[0], ServerEvent::CheckRoomStatus(s) if s.status == RoomStatusKind::UpdateRoom && !s.is_player1));
        assert!(to(&fx, alice).iter().any(|e| matches!(e, ServerEvent::GameReady(_))));
    }

    #[test]
    fn test_challenge_room_outlives_its_game() {
        let mut hub = hub();
        let alice = connect(&mut hub, "alice");
        send(
            &mut hub,
            alice,
            ClientEvent::JoinRoom(JoinRequest {
                room_id: Some("duel-2".into()),
                explicit_join: true,
                options: JoinOptions::default(),
                challenge: Some(Challenge::default()),
            }),
        );
        {
            let room = hub.rooms.get_mut("duel-2").unwrap();
            assert!(room.ai_enabled && room.ready);
            room.game.player2.score = 4;
            room.game.ball.x = 2.0;
            room.game.ball.y = 20.0;
            room.game.ball.dx = -BALL_SPEED_X;
            room.game.ball.dy = 0.0;
            room.game.player1.y = COURT_HEIGHT - PADDLE_HEIGHT;
        }
        let mut fx = Effects::new();
        hub.tick(&mut fx);
        assert_eq!(fx.results[0].winner.as_deref(), Some("AI"));
        assert_eq!(fx.results[0].ai_difficulty, Some(Difficulty::Medium));
        assert!(hub.rooms().get("duel-2").unwrap().game.game_ended);

        disconnect(&mut hub, alice);
        assert!(!hub.rooms().contains("duel-2"));
    }

    #[test]
    fn test_rejoining_ended_challenge_room_does_not_wait() {
        let mut hub = hub();
        let alice = connect(&mut hub, "alice");
        send(
            &mut hub,
            alice,
            ClientEvent::JoinRoom(JoinRequest {
                room_id: Some("duel-3".into()),
                explicit_join: true,
                options: JoinOptions::default(),
                challenge: Some(Challenge::default()),
            }),
        );
        hub.rooms.get_mut("duel-3").unwrap().game.game_ended = true;

        let fx = send(&mut hub, alice, join(Some("duel-3"), JoinMode::None));
        let events = to(&fx, alice);
        assert!(matches!(events[0], ServerEvent::CheckRoomStatus(s) if s.status == RoomStatusKind::UpdateRoom));
        assert!(!events.iter().any(|e| matches!(e, ServerEvent::WaitingForPlayer(_) | ServerEvent::GameReady(_))));
    }

    #[test]
    fn test_second_connection_takes_over_slot() {
        let mut hub = hub();
        let (alice, _) = pvp_room(&mut hub);
        let alice_tab = connect(&mut hub, "alice");

        send(&mut hub, alice_tab, join(Some("room-1"), JoinMode::None));
        assert_eq!(hub.sessions().seat(&alice), None);
        let fx = disconnect(&mut hub, alice);
        assert!(fx.timers.is_empty());
        assert!(hub.rooms().get("room-1").unwrap().ready);
    }
}
