pub mod coordinator;
pub mod events;
pub mod hub;
mod ws;

use axum::{routing::get, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws::chat_ws))
}
