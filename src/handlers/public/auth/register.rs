// handlers/public/auth/register.rs - POST /api/v1/auth/register handler

use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult, JsonBody, TenantId};
use crate::services::{AuthResponse, RegisterRequest};
use crate::AppState;

/// Create a user and its employee record, answering `201 {token, expires_at, user}`.
pub async fn register_post(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    let response = state.accounts.register(tenant_id, request).await?;
    Ok(ApiResponse::created(response).message("Registration successful"))
}
