//! Bridges engine errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::engine::EngineError;

/// Caller-visible error: status code plus a stable `code` string so clients
/// can branch without parsing messages.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    #[cfg(test)]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[cfg(test)]
    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, code = self.code, message = %self.message, "request failed");
        }
        let body = ErrorBody {
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        let (status, code) = match &e {
            EngineError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            EngineError::RoomNumberTaken(_) | EngineError::UsernameTaken(_) => {
                (StatusCode::CONFLICT, "ALREADY_EXISTS")
            }
            EngineError::InvalidRange { .. } => (StatusCode::BAD_REQUEST, "INVALID_RANGE"),
            EngineError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            EngineError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            EngineError::InvalidState(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INVALID_STATE"),
            EngineError::HasActiveReservations(_) => {
                (StatusCode::CONFLICT, "HAS_ACTIVE_RESERVATIONS")
            }
            EngineError::AdminProtected(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            EngineError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION"),
            EngineError::LimitExceeded(_) => (StatusCode::UNPROCESSABLE_ENTITY, "LIMIT_EXCEEDED"),
            EngineError::WalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE"),
        };
        Self::new(status, code, e.to_string())
    }
}
