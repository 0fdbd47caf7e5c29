// handlers/public/health.rs - GET /api/v1/health and GET /api/v1/

use axum::extract::State;
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::AppState;

/// Liveness plus database reachability; 503 when the probe fails.
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    if let Err(e) = state.health.health().await {
        tracing::error!("Health probe failed: {}", e);
        return Err(ApiError::service_unavailable("Database temporarily unavailable"));
    }

    Ok(ApiResponse::success(json!({
        "status": "ok",
        "database": "ok",
        "timestamp": Utc::now(),
    })))
}

pub async fn root() -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "name": "GodPlan API",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}
