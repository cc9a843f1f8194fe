//! HTTP error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use beatmark_analysis::AnalysisError;
use beatmark_library::{AnalyzeError, LoadError};
use serde::Serialize;
use thiserror::Error;

/// Errors returned to API clients as `{"error": message}`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Error: {}", self);
        } else {
            tracing::warn!("Rejected request: {}", self);
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<AnalyzeError> for ApiError {
    fn from(e: AnalyzeError) -> Self {
        match e {
            // Parameters the caller sent
            AnalyzeError::Analysis(AnalysisError::InvalidSensitivity(_)) => {
                Self::BadRequest(e.to_string())
            }
            AnalyzeError::Load(LoadError::Empty) => Self::BadRequest(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}
