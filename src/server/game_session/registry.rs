/// Session registry: who is behind each live connection and where they sit.

use std::collections::HashMap;

use crate::game::types::Side;
use crate::server::matchmaking::types::{ConnId, Identity, RoomId};

#[derive(Debug, Clone)]
pub struct Connection {
    pub identity: Identity,
    /// Room and side, once the connection has been seated.
    pub seat: Option<(RoomId, Side)>,
}

#[derive(Default)]
pub struct SessionRegistry {
    connections: HashMap<ConnId, Connection>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, conn: ConnId, identity: Identity) {
        self.connections.insert(conn, Connection { identity, seat: None });
    }

    pub fn remove(&mut self, conn: &ConnId) -> Option<Connection> {
        self.connections.remove(conn)
    }

    pub fn get(&self, conn: &ConnId) -> Option<&Connection> {
        self.connections.get(conn)
    }

    pub fn identity(&self, conn: &ConnId) -> Option<&Identity> {
        self.connections.get(conn).map(|c| &c.identity)
    }

    pub fn seat(&self, conn: &ConnId) -> Option<(RoomId, Side)> {
        self.connections.get(conn).and_then(|c| c.seat.clone())
    }

    pub fn assign(&mut self, conn: &ConnId, room_id: &str, side: Side) {
        if let Some(connection) = self.connections.get_mut(conn) {
            connection.seat = Some((room_id.to_string(), side));
        }
    }

    /// Clear and return the connection's seat.
    pub fn unassign(&mut self, conn: &ConnId) -> Option<(RoomId, Side)> {
        self.connections.get_mut(conn).and_then(|c| c.seat.take())
    }

    /// Clear the seat only if it points into `room_id`.
    pub fn release_from(&mut self, conn: &ConnId, room_id: &str) {
        if let Some(connection) = self.connections.get_mut(conn) {
            if matches!(&connection.seat, Some((seated, _)) if seated == room_id) {
                connection.seat = None;
            }
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &ConnId> {
        self.connections.keys()
    }
}
