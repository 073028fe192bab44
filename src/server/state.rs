// src/server/state.rs

//! Application state for the backend server.
//!
//! Shared between HTTP/WebSocket handlers: the room server address and the
//! credential verifier used at admission.

use actix::Addr;
use std::sync::Arc;

use crate::server::auth::TokenVerifier;
use crate::server::game_session::server::PongServer;

/// Shared application state, injected into HTTP/WebSocket handlers.
pub struct AppState {
    /// Address of the actor that owns every room.
    pub server: Addr<PongServer>,
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    pub fn new(server: Addr<PongServer>, verifier: Arc<dyn TokenVerifier>) -> Self {
        AppState { server, verifier }
    }
}
