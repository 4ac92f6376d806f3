use axum::{debug_handler, extract::State, routing::get, Json, Router};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{session::USER_ID, AppError, AppResult, AppState};

/// Identity and display name only; credential hashes never leave the
/// database.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/users", get(list_users))
}

/// Everyone except the logged-in user, for the conversation picker.
#[debug_handler(state = crate::AppState)]
async fn list_users(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<Vec<UserInfo>>> {
    let Some(user_id) = session.get::<String>(USER_ID).await? else {
        return Err(AppError::unauthorized());
    };

    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT id,username FROM users WHERE id != ? ORDER BY username")
            .bind(&user_id)
            .fetch_all(&db_pool)
            .await?;

    let mut users = Vec::with_capacity(rows.len());
    for (id, username) in rows {
        users.push(UserInfo {
            id: Uuid::parse_str(&id)?,
            username,
        });
    }

    Ok(Json(users))
}
