pub mod appresult;
pub mod auth;
pub mod chat;
pub mod db;
pub mod messages;
pub mod presence;
pub mod session;
pub mod store;
pub mod users;

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

pub use appresult::{AppError, AppResult};

use chat::coordinator::Coordinator;
use chat::hub::Hub;
use store::MessageStore;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub store: MessageStore,
    pub hub: Hub,
    pub coordinator: Arc<Coordinator>,
}
