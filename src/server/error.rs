// Error responses for the proxy routes
// Body shape: {"error": ..., "message"?: ..., "details"?: ...}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::youtube::api::YouTubeError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        ApiError {
            status,
            body: ErrorBody {
                error: error.into(),
                message: None,
                details: None,
            },
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    pub fn internal(error: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.body.message = Some(message.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.body.details = Some(details.into());
        self
    }

    pub fn missing_query() -> Self {
        Self::bad_request("Query parameter is required")
    }
}

impl From<YouTubeError> for ApiError {
    fn from(err: YouTubeError) -> Self {
        match err {
            YouTubeError::MissingApiKey => {
                error!("YouTube API key not found in environment");
                ApiError::internal("YouTube API key not configured")
                    .with_message("Please add YOUTUBE_API_KEY to your environment")
            }
            other => {
                error!(error = %other, "YouTube search failed");
                ApiError::internal("Failed to search YouTube")
                    .with_message(other.to_string())
                    .with_details("Check your API key and ensure YouTube Data API v3 is enabled")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
