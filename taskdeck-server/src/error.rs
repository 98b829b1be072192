//! HTTP error mapping.
//!
//! Domain failures become precise 400/401/403/404 responses with a
//! `{message}` body; anything unexpected becomes a 500 with
//! `{message: "Server error", error}`.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use taskdeck_proto::api::MessageBody;

use crate::service::TaskError;

/// Errors surfaced by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No usable identity on the request.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// The route is reserved for administrators.
    #[error("Access denied, admin only")]
    AdminOnly,

    /// The request body could not be decoded.
    #[error(transparent)]
    Body(#[from] JsonRejection),

    /// The query string could not be decoded.
    #[error(transparent)]
    Query(#[from] QueryRejection),

    /// A task operation failed.
    #[error(transparent)]
    Task(#[from] TaskError),
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::AdminOnly | Self::Task(TaskError::Forbidden) => StatusCode::FORBIDDEN,
            Self::Body(JsonRejection::JsonDataError(_)) => StatusCode::BAD_REQUEST,
            Self::Body(rejection) => rejection.status(),
            Self::Query(rejection) => rejection.status(),
            Self::Task(TaskError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            Self::Task(TaskError::NotFound) => StatusCode::NOT_FOUND,
            Self::Task(TaskError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Body(rejection) => MessageBody::new(rejection.body_text()),
            Self::Query(rejection) => MessageBody::new(rejection.body_text()),
            Self::Task(TaskError::Store(e)) => {
                tracing::error!(error = %e, "request failed");
                MessageBody::with_error("Server error", e.to_string())
            }
            other => MessageBody::new(other.to_string()),
        };
        (status, Json(body)).into_response()
    }
}
