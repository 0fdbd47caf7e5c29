// handlers/protected/attendance/clock.rs - POST /api/v1/attendance/clock-in, clock-out

use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody, TenantId};
use crate::services::{AttendanceRecord, ClockRequest};
use crate::AppState;

/// Records a clock-in and answers `201`. Out-of-range intents without `force` are `400` and not stored.
pub async fn clock_in_post(
    State(state): State<AppState>,
    auth: AuthUser,
    TenantId(tenant_id): TenantId,
    JsonBody(request): JsonBody<ClockRequest>,
) -> ApiResult<AttendanceRecord> {
    let record = state.attendance.clock_in(tenant_id, auth.user_id, request).await?;
    Ok(ApiResponse::created(record).message("Clock-in recorded"))
}

pub async fn clock_out_post(
    State(state): State<AppState>,
    auth: AuthUser,
    TenantId(tenant_id): TenantId,
    JsonBody(request): JsonBody<ClockRequest>,
) -> ApiResult<AttendanceRecord> {
    let record = state.attendance.clock_out(tenant_id, auth.user_id, request).await?;
    Ok(ApiResponse::success(record).message("Clock-out recorded"))
}
