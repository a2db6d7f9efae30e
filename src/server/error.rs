//! HTTP error mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::stream::StreamError;

use super::api::ErrorBody;

/// Message returned for any resolution service failure.
pub const DOWNLOAD_FAILED_MESSAGE: &str =
    "Failed to download video. Please try a different URL or service.";

/// Errors surfaced to HTTP clients.
///
/// The message is what the client sees; causes of external and internal
/// failures are logged by the handler, not exposed.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Stream not found")]
    NotFound,

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("{0}")]
    ExternalService(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        log::warn!("Rejected request body: {}", rejection.body_text());
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::Validation("Invalid JSON body".to_string())
        }
    }
}

impl From<StreamError> for ApiError {
    fn from(e: StreamError) -> Self {
        match e {
            StreamError::NotFound => ApiError::NotFound,
            StreamError::NoFrames | StreamError::InvalidFrameRate(_) => {
                ApiError::Validation(e.to_string())
            }
        }
    }
}
