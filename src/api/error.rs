//! Error responses

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::WardrobeError;

/// Body of every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Wrapper so handlers can return `Result<_, ApiError>` and use `?`
#[derive(Debug)]
pub struct ApiError(pub WardrobeError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            WardrobeError::Validation(_) | WardrobeError::InvalidId(_) => StatusCode::BAD_REQUEST,
            WardrobeError::NotFound(_) => StatusCode::NOT_FOUND,
            WardrobeError::InvalidOperation(_) => StatusCode::CONFLICT,
            WardrobeError::Authentication(_)
            | WardrobeError::RateLimitExceeded(_)
            | WardrobeError::LlmApi(_)
            | WardrobeError::ModelOutput(_)
            | WardrobeError::Upstream { .. }
            | WardrobeError::Network(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<WardrobeError>,
{
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

impl From<JsonRejection> for WardrobeError {
    fn from(rejection: JsonRejection) -> Self {
        WardrobeError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for WardrobeError {
    fn from(rejection: QueryRejection) -> Self {
        WardrobeError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed ({}): {}", status, self.0);
        } else {
            warn!("Request rejected ({}): {}", status, self.0);
        }

        let body = ErrorBody {
            error: self.0.kind().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
