/// Matchmaking module: room ownership, id recycling, seating and the lobby summary.

pub mod room;
pub mod store;
pub mod lobby;
pub mod types;
