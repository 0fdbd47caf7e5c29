use axum::{
    body::{to_bytes, Body},
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Key fragments whose values never reach a log record.
const SENSITIVE_KEYS: &[&str] = &["password", "token", "secret", "bearer", "auth"];

pub const REDACTED: &str = "[REDACTED]";

pub fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_KEYS.iter().any(|s| key.contains(s))
}

/// Copy of `value` with every sensitive field replaced by [`REDACTED`].
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if is_sensitive_key(k) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact(v)
                    };
                    (k.clone(), v)
                })
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

/// Debug-level JSON body logging; bodies are buffered up to `limit` bytes and redacted.
pub async fn log_request_body(request: Request, next: Next, limit: usize) -> Response {
    let is_json = request
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    if !is_json || !tracing::enabled!(tracing::Level::DEBUG) {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(_) => return ApiError::payload_too_large("Request body too large").into_response(),
    };

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(json) => tracing::debug!(method = %parts.method, path = %parts.uri.path(), body = %redact(&json), "Request body"),
        Err(_) => tracing::debug!(method = %parts.method, path = %parts.uri.path(), "Request body is not valid JSON"),
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
