//! Pong simulation: court types, per-tick physics and the AI opponent.
//!
//! Nothing here knows about rooms or connections; the server layer owns one
//! `GameState` per room and drives it from the global tick.

pub mod types;
pub mod state;
pub mod ai;
pub mod systems;
