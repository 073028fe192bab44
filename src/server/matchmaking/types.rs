use serde::{Serialize, Deserialize};
use uuid::Uuid;

/// Stable string id of a room, e.g. `room-3` or a challenge id.
pub type RoomId = String;

/// Id of one live transport connection.
pub type ConnId = Uuid;

/// Verified identity of a connected user.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
}

/// Public summary of one room, as shown in the lobby.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LobbyEntry {
    pub room_id: RoomId,
    pub player_count: usize,
}
