use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

/// HTTP-facing error space: malformed requests and auth failures answer
/// with client errors, everything else is an opaque 500. Details go to the
/// log, never to the client; passwords are never logged.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed parameters, bad date, missing token, unknown user or
    /// token mismatch.
    BadRequest,
    /// Wrong password on login.
    Forbidden,
    /// Store or serialization failure.
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn internal(error: anyhow::Error) -> Self {
        Self::Internal(error)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        Self::Internal(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal(error) => {
                error!(error = %format!("{error:#}"), "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, status.canonical_reason().unwrap_or("error")).into_response()
    }
}
