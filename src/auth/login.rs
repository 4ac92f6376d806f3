use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{debug_handler, extract::State, Json};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use super::Credentials;
use crate::users::UserInfo;
use crate::{session::USER_ID, AppError, AppResult};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    session: Session,

    Json(Credentials { username, password }): Json<Credentials>,
) -> AppResult<Json<UserInfo>> {
    let row: Option<(String, String)> =
        sqlx::query_as("SELECT id,password_hash FROM users WHERE username=?")
            .bind(username.trim())
            .fetch_optional(&db_pool)
            .await?;

    let Some((id, password_hash)) = row else {
        return Err(AppError::bad_request("user not found"));
    };

    let parsed = PasswordHash::new(&password_hash)
        .map_err(|e| anyhow::anyhow!("stored hash unreadable: {e}"))?;
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_err()
    {
        return Err(AppError::bad_request("invalid credentials"));
    }

    session.insert(USER_ID, id.clone()).await?;

    let id = Uuid::parse_str(&id)?;
    tracing::info!(%id, "logged in");

    Ok(Json(UserInfo {
        id,
        username: username.trim().to_owned(),
    }))
}
