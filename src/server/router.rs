//! HTTP and WebSocket routing configuration.

use actix_web::{web, HttpResponse, Error, error};

use crate::server::game_session::messages::GetLobby;
use crate::server::game_session::session::ws_game;
use crate::server::state::AppState;

/// Configure the application's HTTP/WebSocket routes.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").to(ws_game))
        .service(web::resource("/api/rooms").route(web::get().to(list_rooms)));
}

/// Current lobby, same payload as the `lobbyUpdate` event.
async fn list_rooms(data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let lobby = data
        .server
        .send(GetLobby)
        .await
        .map_err(error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().json(lobby))
}
