use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub err: anyhow::Error,
}

impl AppError {
    pub fn reject(status: StatusCode, reason: impl Into<String>) -> Self {
        Self {
            status,
            err: anyhow::Error::msg(reason.into()),
        }
    }

    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::reject(StatusCode::BAD_REQUEST, reason)
    }

    pub fn unauthorized() -> Self {
        Self::reject(StatusCode::UNAUTHORIZED, "not logged in")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{}\n{}", self.err, self.err.backtrace());
        }

        (self.status, Json(json!({ "error": self.err.to_string() }))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            err: err.into(),
        }
    }
}
