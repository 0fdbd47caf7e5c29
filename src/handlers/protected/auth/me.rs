// handlers/protected/auth/me.rs - GET /api/v1/auth/me handler

use axum::extract::State;

use crate::database::models::UserResponse;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, TenantId};
use crate::AppState;

pub async fn me_get(
    State(state): State<AppState>,
    auth: AuthUser,
    TenantId(tenant_id): TenantId,
) -> ApiResult<UserResponse> {
    let user = state.accounts.current_user(tenant_id, auth.user_id).await?;
    Ok(ApiResponse::success(user))
}
