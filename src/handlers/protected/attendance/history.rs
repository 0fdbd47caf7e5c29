// handlers/protected/attendance/history.rs - GET /api/v1/attendance

use axum::extract::{Query, State};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::database::models::Attendance;
use crate::database::repository::{HistoryQuery, DEFAULT_HISTORY_LIMIT};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, TenantId};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub date: Option<String>,
    pub limit: Option<String>,
}

impl HistoryParams {
    /// Malformed or non-positive limits fall back to the default; a malformed date is an error.
    pub fn into_query(self) -> Result<HistoryQuery, ApiError> {
        let date = match self.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| ApiError::bad_request("date must be formatted as YYYY-MM-DD"))?,
            ),
            None => None,
        };

        let limit = self
            .limit
            .as_deref()
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_HISTORY_LIMIT);

        Ok(HistoryQuery { date, limit })
    }
}

/// The caller's own attendance history, newest first.
pub async fn attendance_get(
    State(state): State<AppState>,
    auth: AuthUser,
    TenantId(tenant_id): TenantId,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Vec<Attendance>> {
    let query = params.into_query()?;
    let rows = state.attendance.history(tenant_id, auth.user_id, query).await?;
    Ok(ApiResponse::success(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(date: Option<&str>, limit: Option<&str>) -> HistoryParams {
        HistoryParams {
            date: date.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn limit_falls_back_to_thirty() {
        for raw in [None, Some("0"), Some("-5"), Some("ten"), Some("")] {
            assert_eq!(params(None, raw).into_query().unwrap().limit, 30, "{raw:?}");
        }
        assert_eq!(params(None, Some("10")).into_query().unwrap().limit, 10);
    }

    #[test]
    fn date_must_be_iso() {
        let query = params(Some("2024-03-09"), None).into_query().unwrap();
        assert_eq!(query.date, NaiveDate::from_ymd_opt(2024, 3, 9));
        assert!(params(Some("09/03/2024"), None).into_query().is_err());
        assert!(params(Some(""), None).into_query().unwrap().date.is_none());
    }
}
