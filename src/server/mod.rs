// src/server/mod.rs

//! Server layer root module.
//!
//! This module organizes the backend server components:
//! - Application state and routing
//! - Admission (bearer token verification)
//! - Matchmaking (room store, seating, lobby)
//! - Game sessions (protocol handler, game loop actor, websocket sessions)
//! - Match result recording

pub mod state;
pub mod router;
pub mod auth;
pub mod records;
pub mod matchmaking;
pub mod game_session;
pub mod ws_error;
