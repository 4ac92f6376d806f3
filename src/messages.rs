use std::collections::HashMap;

use axum::{debug_handler, extract::{Path, State}, routing::get, Json, Router};
use tower_sessions::Session;
use uuid::Uuid;

use crate::store::{Message, MessageStore};
use crate::{session::USER_ID, AppError, AppResult, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages/{a}/{b}", get(history))
        .route("/unread/{user_id}", get(unread))
}

/// Full conversation between two users, oldest first. No pagination.
#[debug_handler(state = crate::AppState)]
async fn history(
    State(store): State<MessageStore>,
    session: Session,
    Path((a, b)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Vec<Message>>> {
    require_login(&session).await?;
    Ok(Json(store.history(a, b).await?))
}

/// Per-sender unread counts for the conversation badges.
#[debug_handler(state = crate::AppState)]
async fn unread(
    State(store): State<MessageStore>,
    session: Session,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<HashMap<Uuid, i64>>> {
    require_login(&session).await?;
    Ok(Json(store.unread_counts(user_id).await?))
}

async fn require_login(session: &Session) -> AppResult<()> {
    if session.get::<String>(USER_ID).await?.is_none() {
        return Err(AppError::unauthorized());
    }
    Ok(())
}
