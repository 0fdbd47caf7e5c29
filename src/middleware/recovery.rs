use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// Panic handler for `CatchPanicLayer`: log the payload, answer with a bare 500.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!(panic = %detail, "Handler panicked");
    ApiError::internal_server_error("An unexpected error occurred").into_response()
}

/// Rewrites the bare `408` from `TimeoutLayer` into the failure envelope.
pub async fn envelope_timeout(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        tracing::warn!("Request exceeded the transport deadline");
        return ApiError::request_timeout("Request took too long to complete").into_response();
    }
    response
}
