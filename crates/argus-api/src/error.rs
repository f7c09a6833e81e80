//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use argus_fetch::FetchError;
use argus_vision::VisionError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("No snapshot URI available for camera")]
    MissingSnapshot,

    #[error("Failed to fetch snapshot: {0}")]
    UpstreamFetch(FetchError),

    #[error("Analysis failed: {0}")]
    Vision(#[from] VisionError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::MissingSnapshot => StatusCode::BAD_REQUEST,
            ApiError::UpstreamFetch(_) => StatusCode::BAD_GATEWAY,
            ApiError::Vision(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        // Re-encoding our own bitmap is not an upstream failure
        match err {
            FetchError::Encode(msg) => ApiError::Internal(msg),
            other => ApiError::UpstreamFetch(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = match &self {
            ApiError::Vision(_) | ApiError::Internal(_) => {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "An internal error occurred".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_fetch_maps_to_502() {
        let err = ApiError::from(FetchError::UpstreamStatus { status: 404 });
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_missing_snapshot_maps_to_400() {
        assert_eq!(ApiError::MissingSnapshot.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_model_unavailable_maps_to_500() {
        let err = ApiError::from(VisionError::model_unavailable("no model"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_encode_failure_is_internal_not_upstream() {
        let err = ApiError::from(FetchError::Encode("boom".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
