//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use communicator::CommError;
use order_saga::CoordinatorError;
use registry::RegistryError;
use saga_engine::SagaError;

/// API-level error type that maps to HTTP responses.
///
/// A saga that runs to a terminal FAILED status is never represented here —
/// per §7, that is a successful 200 response carrying the saga's own
/// failure detail. `ApiError` only covers protocol and configuration-shaped
/// failures at the coordinator's edge.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Malformed or invalid input from the client.
    BadRequest(String),
    /// Communicator-level failure (e.g. probing a participant).
    Comm(CommError),
    /// Saga engine invariant violation.
    Saga(SagaError),
    /// Registry lookup/bookkeeping error.
    Registry(RegistryError),
    /// Coordinator-level error (e.g. aborting a saga that already finished).
    Coordinator(CoordinatorError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Comm(err) => {
                tracing::error!(error = %err, "communicator error at API edge");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Saga(err) => {
                tracing::error!(error = %err, "saga engine invariant violation");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Registry(err) => registry_error_to_response(err),
            ApiError::Coordinator(err) => coordinator_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn registry_error_to_response(err: RegistryError) -> (StatusCode, String) {
    match &err {
        RegistryError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        RegistryError::AlreadyRegistered(_) => (StatusCode::CONFLICT, err.to_string()),
    }
}

fn coordinator_error_to_response(err: CoordinatorError) -> (StatusCode, String) {
    let message = err.to_string();
    match err {
        CoordinatorError::NotRunning(_) => (StatusCode::NOT_FOUND, message),
        CoordinatorError::Registry(registry_err) => registry_error_to_response(registry_err),
    }
}

impl From<CommError> for ApiError {
    fn from(err: CommError) -> Self {
        ApiError::Comm(err)
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        ApiError::Registry(err)
    }
}

impl From<CoordinatorError> for ApiError {
    fn from(err: CoordinatorError) -> Self {
        ApiError::Coordinator(err)
    }
}
