//! Mapping of pipeline failures onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shorts_core::PipelineError;
use tracing::{error, warn};

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Assembly sub-stage that failed (video assembly only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<&'static str>,
}

/// Status code for a pipeline failure.
pub fn status_for(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::NotFound { .. } => StatusCode::NOT_FOUND,
        PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
        PipelineError::Precondition(_) => StatusCode::CONFLICT,
        PipelineError::Collaborator { .. }
        | PipelineError::Assembly(_)
        | PipelineError::Storage(_)
        | PipelineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// A pipeline failure returned from a JSON handler.
#[derive(Debug)]
pub struct ApiError {
    error: PipelineError,
    with_stage: bool,
}

impl ApiError {
    /// Report the failing stage alongside the message.
    pub fn with_stage(error: PipelineError) -> Self {
        Self {
            error,
            with_stage: true,
        }
    }

    /// Assembly failures name their sub-stage; other failures their category.
    fn stage(&self) -> Option<&'static str> {
        if !self.with_stage {
            return None;
        }
        Some(match &self.error {
            PipelineError::Assembly(e) => e.stage(),
            other => other.category(),
        })
    }
}

impl From<PipelineError> for ApiError {
    fn from(error: PipelineError) -> Self {
        Self {
            error,
            with_stage: false,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.error);
        if status.is_server_error() {
            error!(category = self.error.category(), error = %self.error, "Request failed");
        } else {
            warn!(category = self.error.category(), error = %self.error, "Request rejected");
        }
        let body = ErrorResponse {
            error: self.error.to_string(),
            stage: self.stage(),
        };
        (status, Json(body)).into_response()
    }
}
