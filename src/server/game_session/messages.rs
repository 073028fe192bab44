use actix::prelude::*;
use serde::{Serialize, Deserialize};

use crate::game::state::GameState;
use crate::game::types::FinalScore;
use crate::server::matchmaking::types::{ConnId, Identity, LobbyEntry, RoomId};

// Client -> serveur

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "action", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    JoinRoom(JoinRequest),
    PaddleMove(PaddleMove),
    SetDifficulty(SetDifficulty),
    LeaveRoom,
    Ping,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    #[serde(default)]
    pub room_id: Option<RoomId>,
    /// False asks the server for the opponent prompt instead of a room.
    #[serde(default)]
    pub explicit_join: bool,
    #[serde(default)]
    pub options: JoinOptions,
    #[serde(default)]
    pub challenge: Option<Challenge>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct JoinOptions {
    #[serde(default)]
    pub mode: JoinMode,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JoinMode {
    #[serde(rename = "AI")]
    Ai,
    #[serde(rename = "PVP")]
    Pvp,
    #[default]
    #[serde(rename = "NONE", alias = "NOTHING")]
    None,
}

/// Direct match against a named opponent; without one, against the AI.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    #[serde(default)]
    pub opponent_id: Option<String>,
    #[serde(default)]
    pub opponent_name: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PaddleMove {
    pub y: f32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetDifficulty {
    pub level: String,
    #[serde(default)]
    pub room_id: Option<RoomId>,
}

/// Everything a connection can ask of the room layer.
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    Client(ClientEvent),
    Disconnect,
}

// Serveur -> client

#[derive(Message, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[rtype(result = "()")]
#[serde(tag = "action", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    LobbyUpdate(Vec<LobbyEntry>),
    PlayerAssignment(PlayerAssignment),
    CheckRoomStatus(RoomStatus),
    WaitingForPlayer(Notice),
    GameReady(Notice),
    GameUpdate(GameUpdate),
    OpponentDisconnected(Notice),
    OpponentReconnected(Notice),
    GameEnded(GameEnded),
    ChooseOpponent,
}

impl ServerEvent {
    pub fn waiting(message: impl Into<String>) -> Self {
        Self::WaitingForPlayer(Notice::new(message))
    }
    pub fn ready(message: impl Into<String>) -> Self {
        Self::GameReady(Notice::new(message))
    }
    pub fn opponent_disconnected(message: impl Into<String>) -> Self {
        Self::OpponentDisconnected(Notice::new(message))
    }
    pub fn opponent_reconnected(message: impl Into<String>) -> Self {
        Self::OpponentReconnected(Notice::new(message))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Notice {
    pub message: String,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAssignment {
    pub is_player1: bool,
    pub room_id: RoomId,
    pub players_in_room: usize,
    pub message: String,
    pub ai_enabled: bool,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RoomStatusKind {
    RoomFull,
    UpdateRoom,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatus {
    pub room_id: RoomId,
    pub status: RoomStatusKind,
    pub message: String,
    pub is_player1: bool,
    pub ai_enabled: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameUpdate {
    pub room_id: RoomId,
    pub state: GameState,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameEnded {
    pub room_id: RoomId,
    /// User id of the winner, "AI", or None on a tie.
    pub winner: Option<String>,
    pub final_score: FinalScore,
}

// Session -> PongServer

#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub conn: ConnId,
    pub identity: Identity,
    pub addr: Recipient<ServerEvent>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub conn: ConnId,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct ProcessClientMessage {
    pub conn: ConnId,
    pub msg: ClientEvent,
}

#[derive(Message)]
#[rtype(result = "Vec<LobbyEntry>")]
pub struct GetLobby;
