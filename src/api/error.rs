use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::api::envelope::EnvelopeError;
use crate::domain::error::DomainError;
use crate::pipeline::PipelineError;
use crate::storage::event_log::EventLogError;

/// HTTP-facing error: a status code plus a user-facing message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{resource} {id} not found"))
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match &err {
            DomainError::AlreadyLaunched | DomainError::AlreadyExploded => {
                Self::conflict(err.to_string())
            }
            DomainError::OutOfOrder { .. } => {
                // The sequencer filters stale sequences before the apply
                // path; the aggregate rejecting one anyway is a bug.
                error!(error = %err, "aggregate rejected a sequence the sequencer let through");
                Self::internal(err.to_string())
            }
            _ => Self::bad_request(err.to_string()),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Stale { .. } => Self::conflict(err.to_string()),
            PipelineError::Domain(err) => err.into(),
            PipelineError::Storage(err) => err.into(),
            PipelineError::Stopped => Self::unavailable(err.to_string()),
        }
    }
}

impl From<EventLogError> for ApiError {
    fn from(err: EventLogError) -> Self {
        Self::unavailable(err.to_string())
    }
}

impl From<EnvelopeError> for ApiError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Domain(err) => err.into(),
            other => Self::bad_request(other.to_string()),
        }
    }
}
