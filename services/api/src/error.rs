//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and the JSON
//! error bodies it renders into.

use crate::config::ConfigError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use social_core::ports::PortError;
use tracing::error;
use utoipa::ToSchema;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the datastore port.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The request body was not JSON, or did not match the expected shape.
    #[error("{}", .0.body_text())]
    JsonBody(#[from] JsonRejection),

    /// A path segment could not be parsed (e.g. an id that is not a UUID).
    #[error("{}", .0.body_text())]
    PathParams(#[from] PathRejection),

    /// A lookup matched nothing; carries the message shown to the caller.
    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    /// Turns a datastore `NotFound` into `ApiError::NotFound(message)`,
    /// passing every other port error through.
    pub fn not_found_as(message: &'static str) -> impl FnOnce(PortError) -> ApiError {
        move |e| match e {
            PortError::NotFound(_) => ApiError::NotFound(message.to_string()),
            other => ApiError::Port(other),
        }
    }
}

//=========================================================================================
// Error Response Bodies
//=========================================================================================

/// Body of a 404 response, and of informational responses.
#[derive(Serialize, ToSchema)]
pub struct MessageBody {
    pub message: String,
}

/// Body of a 400 or 500 response. Carries the underlying message as-is.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) | ApiError::Port(PortError::NotFound(message)) => {
                (StatusCode::NOT_FOUND, Json(MessageBody { message })).into_response()
            }
            ApiError::Port(PortError::Validation(error)) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody { error })).into_response()
            }
            rejected @ (ApiError::JsonBody(_) | ApiError::PathParams(_)) => {
                let error = rejected.to_string();
                (StatusCode::BAD_REQUEST, Json(ErrorBody { error })).into_response()
            }
            ApiError::Port(PortError::Unexpected(error)) => {
                error!("Datastore fault: {}", error);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody { error })).into_response()
            }
            other => {
                error!("Request failed: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: other.to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}
