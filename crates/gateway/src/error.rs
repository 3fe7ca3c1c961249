//! Mapping run errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use react_agent_core::Error;
use serde::Serialize;
use utoipa::ToSchema;

/// Error body: `{"error": "...", "kind": "..."}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: String,
    pub message: String,
}

impl ApiError {
    /// A request that is well-formed JSON but unusable.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "invalid_request".into(),
            message: message.into(),
        }
    }
}

/// HTTP status for a run error.
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::InvalidState(_) => StatusCode::BAD_REQUEST,
        Error::LoopLimitExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::CollaboratorUnavailable(_) => StatusCode::BAD_GATEWAY,
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self {
            status: status_for(&err),
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, kind = %self.kind, error = %self.message, "Request failed");
        } else {
            tracing::warn!(status = %self.status, kind = %self.kind, error = %self.message, "Request rejected");
        }
        let body = ErrorResponse {
            error: self.message,
            kind: self.kind,
        };
        (self.status, Json(body)).into_response()
    }
}
