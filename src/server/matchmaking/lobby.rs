//! Lobby derivation.
//!
//! The lobby is never stored: it is recomputed from the room store every time
//! a room appears, disappears or changes occupancy.

use super::store::RoomStore;
use super::types::LobbyEntry;

/// Every room with its human player count, in creation order.
pub fn lobby_entries(store: &RoomStore) -> Vec<LobbyEntry> {
    store
        .iter()
        .map(|room| LobbyEntry {
            room_id: room.id.clone(),
            player_count: room.player_count(),
        })
        .collect()
}
