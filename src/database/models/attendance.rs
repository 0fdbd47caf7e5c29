use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceType {
    In,
    Out,
}

impl AttendanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceType::In => "in",
            AttendanceType::Out => "out",
        }
    }
}

/// Outcome of an attendance intent. `Rejected` is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Approved,
    Forced,
    Rejected,
}

impl AttendanceStatus {
    /// Derive the outcome of a geofence result and the caller's override flag.
    pub fn derive(in_range: bool, force: bool) -> Self {
        match (in_range, force) {
            (true, _) => AttendanceStatus::Approved,
            (false, true) => AttendanceStatus::Forced,
            (false, false) => AttendanceStatus::Rejected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Approved => "approved",
            AttendanceStatus::Forced => "forced",
            AttendanceStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown variant '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for AttendanceType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(AttendanceType::In),
            "out" => Ok(AttendanceType::Out),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(AttendanceStatus::Approved),
            "forced" => Ok(AttendanceStatus::Forced),
            "rejected" => Ok(AttendanceStatus::Rejected),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// A persisted clock-in or clock-out. Rows are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: i64,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: AttendanceType,
    pub status: AttendanceStatus,
    pub latitude: f64,
    pub longitude: f64,
    pub photo_selfie: String,
    pub in_range: bool,
    pub force_attendance: bool,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for Attendance {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let kind: String = row.try_get("type")?;
        let status: String = row.try_get("status")?;

        Ok(Self {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            user_id: row.try_get("user_id")?,
            kind: kind.parse().map_err(|e| sqlx::Error::ColumnDecode {
                index: "type".into(),
                source: Box::new(e),
            })?,
            status: status.parse().map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".into(),
                source: Box::new(e),
            })?,
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
            photo_selfie: row.try_get("photo_selfie")?,
            in_range: row.try_get("in_range")?,
            force_attendance: row.try_get("force_attendance")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Insert payload built by the attendance engine after the geofence check.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub kind: AttendanceType,
    pub status: AttendanceStatus,
    pub latitude: f64,
    pub longitude: f64,
    pub photo_selfie: String,
    pub in_range: bool,
    pub force_attendance: bool,
}
