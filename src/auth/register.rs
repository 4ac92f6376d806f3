use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHasher};
use axum::{debug_handler, extract::State, http::StatusCode, Json};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use super::Credentials;
use crate::store::now_ms;
use crate::users::UserInfo;
use crate::{session::USER_ID, AppError, AppResult};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    session: Session,

    Json(Credentials { username, password }): Json<Credentials>,
) -> AppResult<Json<UserInfo>> {
    let username = username.trim().to_owned();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::bad_request("username and password must not be empty"));
    }

    let taken: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE username=?")
        .bind(&username)
        .fetch_optional(&db_pool)
        .await?;
    if taken.is_some() {
        return Err(AppError::reject(StatusCode::CONFLICT, "username already taken"));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("hashing password: {e}"))?
        .to_string();

    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO users (id,username,password_hash,created_at) VALUES (?,?,?,?)")
        .bind(id.to_string())
        .bind(&username)
        .bind(&password_hash)
        .bind(now_ms())
        .execute(&db_pool)
        .await?;

    // Auto-login after register.
    session.insert(USER_ID, id.to_string()).await?;
    tracing::info!(%id, username, "registered");

    Ok(Json(UserInfo { id, username }))
}
