/// Room store.
///
/// Owns every active room, allocates ids of the form `room-<n>` and recycles
/// the numeric suffix of released rooms smallest-first before growing the
/// counter further.

use std::collections::{BTreeSet, HashMap};
use log::info;

use crate::config::server::ROOM_ID_PREFIX;
use super::room::Room;
use super::types::RoomId;

pub struct RoomStore {
    rooms: HashMap<RoomId, Room>,
    /// Room ids in creation order.
    order: Vec<RoomId>,
    /// Released suffixes, ascending.
    free_suffixes: BTreeSet<u32>,
    next_suffix: u32,
}

impl Default for RoomStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomStore {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            order: Vec::new(),
            free_suffixes: BTreeSet::new(),
            next_suffix: 1,
        }
    }

    /// Fetch the room named `explicit_id`, creating it if needed, or create a
    /// fresh anonymous room when no id is given.
    pub fn allocate_room(&mut self, explicit_id: Option<&str>) -> &mut Room {
        let id = match explicit_id {
            Some(id) => {
                if !self.rooms.contains_key(id) {
                    if let Some(suffix) = parse_suffix(id) {
                        self.free_suffixes.remove(&suffix);
                    }
                }
                id.to_string()
            }
            None => self.next_free_id(),
        };
        if !self.rooms.contains_key(&id) {
            info!("[RoomStore] Room {} created", id);
            self.order.push(id.clone());
        }
        self.rooms.entry(id.clone()).or_insert_with(|| Room::new(id))
    }

    /// First room, in creation order, with a free seat. With `exclude_ai`,
    /// AI rooms are skipped.
    pub fn find_joinable(&self, exclude_ai: bool) -> Option<RoomId> {
        self.iter()
            .find(|room| {
                room.player_count() < 2
                    && !(exclude_ai && room.ai_enabled)
                    && !room.challenge
                    && !room.game.game_ended
            })
            .map(|room| room.id.clone())
    }

    /// Remove a room and return its suffix to the free list.
    pub fn release_room(&mut self, id: &str) -> Option<Room> {
        let room = self.rooms.remove(id)?;
        self.order.retain(|existing| existing != id);
        if let Some(suffix) = parse_suffix(id) {
            if suffix < self.next_suffix {
                self.free_suffixes.insert(suffix);
            }
        }
        info!("[RoomStore] Room {} released after {:?}", id, room.created_at.elapsed());
        Some(room)
    }

    pub fn get(&self, id: &str) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rooms.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Rooms in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.order.iter().filter_map(|id| self.rooms.get(id))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Room> {
        self.rooms.values_mut()
    }

    fn next_free_id(&mut self) -> RoomId {
        while let Some(suffix) = self.free_suffixes.pop_first() {
            let id = format_id(suffix);
            if !self.rooms.contains_key(&id) {
                return id;
            }
        }
        loop {
            let id = format_id(self.next_suffix);
            self.next_suffix += 1;
            if !self.rooms.contains_key(&id) {
                return id;
            }
        }
    }
}

fn format_id(suffix: u32) -> RoomId {
    format!("{}{}", ROOM_ID_PREFIX, suffix)
}

fn parse_suffix(id: &str) -> Option<u32> {
    id.strip_prefix(ROOM_ID_PREFIX)?.parse().ok()
}
