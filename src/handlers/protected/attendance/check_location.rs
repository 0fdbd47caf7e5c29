// handlers/protected/attendance/check_location.rs - POST /api/v1/attendance/check-location

use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::services::{LocationCheck, LocationRequest};
use crate::AppState;

/// Geofence query without side effects.
pub async fn check_location_post(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LocationRequest>,
) -> ApiResult<LocationCheck> {
    let check = state.attendance.check_location(&request);
    let message = check.message.clone();
    Ok(ApiResponse::success(check).message(message))
}
