use crate::gameserver::{GameError, ParseGameIdError};
use crate::session::{InvalidSessionToken, SessionError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// An error ready to leave the server: a status code plus a message that is
/// rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        let status = match err {
            GameError::NotFound => StatusCode::NOT_FOUND,
            GameError::GameFull | GameError::InvalidMove { .. } | GameError::Rules(_) => {
                StatusCode::BAD_REQUEST
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound => Self::new(StatusCode::UNAUTHORIZED, "session not found"),
            SessionError::Storage(err) => {
                tracing::error!(error = %err, "session storage failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        }
    }
}

impl From<InvalidSessionToken> for ApiError {
    fn from(err: InvalidSessionToken) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<ParseGameIdError> for ApiError {
    fn from(err: ParseGameIdError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<scouts::ParseMoveError> for ApiError {
    fn from(err: scouts::ParseMoveError) -> Self {
        Self::bad_request(err.to_string())
    }
}
