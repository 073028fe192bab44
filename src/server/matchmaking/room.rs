//! Room and player slot.
//!
//! A room owns its game state, its AI controller and every timer handle tied
//! to it, so tearing the room down hands all of them back in one place.

use actix::SpawnHandle;
use std::time::Instant;

use crate::game::ai::AiController;
use crate::game::state::GameState;
use crate::game::types::{Difficulty, Side};
use super::types::{ConnId, Identity, RoomId};

/// One of the two seats of a room.
#[derive(Debug, Clone)]
pub struct PlayerSlot {
    /// Live connection, None while disconnected (grace period) or reserved.
    pub conn: Option<ConnId>,
    pub identity: Identity,
    pub side: Side,
    pub disconnected: bool,
    /// Held for an invited opponent who has not connected yet.
    pub reserved: bool,
    /// Pending vacate timer while `disconnected`.
    pub grace_timer: Option<SpawnHandle>,
}

#[derive(Debug)]
pub struct Room {
    pub id: RoomId,
    slots: [Option<PlayerSlot>; 2],
    pub game: GameState,
    pub ai_enabled: bool,
    pub ai: AiController,
    pub ready: bool,
    pub created_at: Instant,
    /// Created through the challenge flow; survives the end of its game.
    pub challenge: bool,
    /// Cadence of `AiController::refresh_target`, while the game runs.
    pub ai_timer: Option<SpawnHandle>,
}

impl Room {
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            slots: [None, None],
            game: GameState::new(),
            ai_enabled: false,
            ai: AiController::new(Side::Player2, Difficulty::default()),
            ready: false,
            created_at: Instant::now(),
            challenge: false,
            ai_timer: None,
        }
    }

    pub fn slot(&self, side: Side) -> Option<&PlayerSlot> {
        self.slots[side.index()].as_ref()
    }

    pub fn slot_mut(&mut self, side: Side) -> Option<&mut PlayerSlot> {
        self.slots[side.index()].as_mut()
    }

    pub fn slots(&self) -> impl Iterator<Item = &PlayerSlot> {
        self.slots.iter().flatten()
    }

    /// Occupied human slots, including those held during a grace period.
    pub fn player_count(&self) -> usize {
        self.slots().count()
    }

    /// Live human connections.
    pub fn connected_count(&self) -> usize {
        self.slots().filter(|slot| slot.conn.is_some()).count()
    }

    /// An AI room seats a single human; any room seats at most two.
    pub fn is_full(&self) -> bool {
        self.player_count() >= 2 || (self.ai_enabled && self.player_count() >= 1)
    }

    /// Side held by the given user in this room, if any.
    pub fn side_of(&self, user_id: &str) -> Option<Side> {
        self.slots()
            .find(|slot| slot.identity.user_id == user_id)
            .map(|slot| slot.side)
    }

    pub fn first_open_side(&self) -> Option<Side> {
        Side::BOTH.into_iter().find(|side| self.slots[side.index()].is_none())
    }

    /// Seat `identity` on `side`. Without a connection the slot starts out
    /// disconnected.
    pub fn seat(&mut self, side: Side, identity: Identity, conn: Option<ConnId>) {
        self.slots[side.index()] = Some(PlayerSlot {
            disconnected: conn.is_none(),
            reserved: false,
            conn,
            identity,
            side,
            grace_timer: None,
        });
    }

    /// Hold `side` for an invited identity until it joins.
    pub fn reserve(&mut self, side: Side, identity: Identity) {
        self.seat(side, identity, None);
        if let Some(slot) = self.slot_mut(side) {
            slot.reserved = true;
        }
    }

    /// No slot is held by anyone who has played here: every remaining slot is
    /// an unclaimed reservation. True for an empty room.
    pub fn is_abandoned(&self) -> bool {
        self.slots().all(|slot| slot.reserved)
    }

    pub fn vacate(&mut self, side: Side) -> Option<PlayerSlot> {
        self.slots[side.index()].take()
    }

    /// Hand the AI the seat opposite to the first human.
    pub fn enable_ai(&mut self) {
        let human = self.slots().next().map(|slot| slot.side).unwrap_or(Side::Player1);
        self.ai_enabled = true;
        self.ai = AiController::new(human.opponent(), self.ai.difficulty);
    }

    pub fn connected_conns(&self) -> Vec<ConnId> {
        self.slots().filter_map(|slot| slot.conn).collect()
    }

    /// Connections of everyone except the holder of `side`.
    pub fn other_conns(&self, side: Side) -> Vec<ConnId> {
        self.slots()
            .filter(|slot| slot.side != side)
            .filter_map(|slot| slot.conn)
            .collect()
    }

    /// True when the game may run: not over, and either the AI room has its
    /// human connected or both human seats are live.
    pub fn can_start(&self) -> bool {
        if self.game.game_ended {
            return false;
        }
        if self.ai_enabled {
            self.connected_count() >= 1
        } else {
            self.connected_count() == 2
        }
    }

    /// Take every timer handle owned by the room and its slots.
    pub fn take_timers(&mut self) -> Vec<SpawnHandle> {
        let mut handles: Vec<SpawnHandle> = self.ai_timer.take().into_iter().collect();
        for slot in self.slots.iter_mut().flatten() {
            handles.extend(slot.grace_timer.take());
        }
        handles
    }

    /// User id shown for a side in results: the seated user, or "AI".
    pub fn participant(&self, side: Side) -> String {
        match self.slot(side) {
            Some(slot) => slot.identity.user_id.clone(),
            None if self.ai_enabled && self.ai.side == side => "AI".to_string(),
            None => "unknown".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn identity(id: &str) -> Identity {
        Identity { user_id: id.to_string(), username: id.to_string() }
    }

    #[test]
    fn test_seating_and_capacity() {
        let mut room = Room::new("room-1".to_string());
        assert_eq!(room.first_open_side(), Some(Side::Player1));

        room.seat(Side::Player1, identity("alice"), Some(Uuid::new_v4()));
        assert_eq!(room.first_open_side(), Some(Side::Player2));
        assert!(!room.is_full());

        room.seat(Side::Player2, identity("bob"), Some(Uuid::new_v4()));
        assert!(room.is_full());
        assert_eq!(room.first_open_side(), None);
        assert_eq!(room.side_of("bob"), Some(Side::Player2));
        assert!(room.can_start());
    }

    #[test]
    fn test_ai_room_admits_one_human() {
        let mut room = Room::new("room-1".to_string());
        room.seat(Side::Player1, identity("alice"), Some(Uuid::new_v4()));
        room.enable_ai();
        assert!(room.is_full());
        assert_eq!(room.ai.side, Side::Player2);
        assert_eq!(room.player_count(), 1);
        assert!(room.can_start());
        assert_eq!(room.participant(Side::Player2), "AI");
    }

    #[test]
    fn test_reservation_blocks_start() {
        let mut room = Room::new("duel".to_string());
        room.seat(Side::Player1, identity("alice"), Some(Uuid::new_v4()));
        room.reserve(Side::Player2, identity("bob"));
        assert!(room.slot(Side::Player2).unwrap().disconnected);
        assert_eq!(room.player_count(), 2);
        assert!(!room.can_start());
        assert!(!room.is_abandoned());

        room.vacate(Side::Player1);
        assert!(room.is_abandoned());
    }

    #[test]
    fn test_take_timers_collects_all_handles() {
        let mut room = Room::new("room-1".to_string());
        room.seat(Side::Player1, identity("alice"), None);
        let first = SpawnHandle::default().next();
        room.ai_timer = Some(first);
        room.slot_mut(Side::Player1).unwrap().grace_timer = Some(first.next());

        assert_eq!(room.take_timers(), vec![first, first.next()]);
        assert!(room.take_timers().is_empty());
    }
}
