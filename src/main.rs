//! Main entry point for the pong room server.
//!
//! Initializes logging and settings, starts the room server actor, and
//! launches the HTTP server with the game WebSocket and the lobby endpoint.

use actix::Actor;
use actix_web::{web, App, HttpServer};
use log::info;
use std::sync::Arc;

use config::server::ServerSettings;
use server::auth::JwtVerifier;
use server::game_session::server::PongServer;
use server::records::{JsonLinesRecorder, LogRecorder, MatchRecorder};

pub mod config;
mod server;
mod game;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Logger from RUST_LOG, info by default.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = ServerSettings::from_env();

    let recorder: Arc<dyn MatchRecorder> = match &settings.match_log {
        Some(path) => {
            info!("[Main] Match results appended to {}", path.display());
            Arc::new(JsonLinesRecorder::new(path.clone()))
        }
        None => Arc::new(LogRecorder),
    };

    // One actor owns every room and runs the game loop.
    let server = PongServer::new(recorder).start();

    let state = web::Data::new(server::state::AppState::new(
        server,
        Arc::new(JwtVerifier::new(&settings.jwt_secret)),
    ));

    info!("[Main] Listening on {}:{}", settings.host, settings.port);
    HttpServer::new(move || {
        App::new()
            .wrap(
                actix_web::middleware::DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Headers", "*"))
            )
            .app_data(state.clone())
            .configure(crate::server::router::config)
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await
}
