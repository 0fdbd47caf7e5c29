// handlers/public/auth/login.rs - POST /api/v1/auth/login handler

use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult, JsonBody, TenantId};
use crate::services::{AuthResponse, LoginRequest};
use crate::AppState;

pub async fn login_post(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let response = state.accounts.login(tenant_id, request).await?;
    Ok(ApiResponse::success(response).message("Login successful"))
}
