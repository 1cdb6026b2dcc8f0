use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Errors a handler can return. The message is always passed on to the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Invalid or missing request input.
    #[error("{0}")]
    BadRequest(String),

    /// Provider or storage failure.
    #[error(transparent)]
    Internal(#[from] dl_core::Error),
}

#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(message) => {
                tracing::warn!(error = %message, "bad request");
                StatusCode::BAD_REQUEST
            }
            Self::Internal(err) => {
                tracing::error!(error = %err, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
