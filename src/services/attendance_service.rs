use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::database::models::{Attendance, AttendanceStatus, AttendanceType, NewAttendance};
use crate::database::{AttendanceRepository, HistoryQuery, RepositoryError, UserRepository};
use crate::error::ApiError;
use crate::geofence::{GeofencePolicy, GeofenceResult};

#[derive(Debug, thiserror::Error)]
pub enum AttendanceError {
    #[error("You are {distance:.0} m from the office, outside the {radius:.0} m attendance radius. Set force to record anyway")]
    OutOfRange { distance: f64, radius: f64 },

    #[error("No active employee record for this user")]
    EmployeeNotFound,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<AttendanceError> for ApiError {
    fn from(err: AttendanceError) -> Self {
        match err {
            AttendanceError::OutOfRange { .. } => ApiError::bad_request(err.to_string()),
            AttendanceError::EmployeeNotFound => ApiError::not_found(err.to_string()),
            AttendanceError::Repository(e) => e.into(),
        }
    }
}

/// Clock-in/clock-out body. Absent fields decode to zero values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClockRequest {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub photo_selfie: String,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationRequest {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationCheck {
    pub in_range: bool,
    pub message: String,
    pub need_force: bool,
    pub distance: f64,
    pub max_radius: f64,
}

/// A persisted event echoed back with the geofence figures that admitted it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRecord {
    #[serde(flatten)]
    pub attendance: Attendance,
    pub distance: f64,
    pub max_radius: f64,
}

/// Geofence-gated attendance ingestion.
#[derive(Clone)]
pub struct AttendanceService {
    attendances: Arc<dyn AttendanceRepository>,
    users: Arc<dyn UserRepository>,
    policy: GeofencePolicy,
}

impl AttendanceService {
    pub fn new(
        attendances: Arc<dyn AttendanceRepository>,
        users: Arc<dyn UserRepository>,
        policy: GeofencePolicy,
    ) -> Self {
        Self {
            attendances,
            users,
            policy,
        }
    }

    /// Stateless geofence query; never persists.
    pub fn check_location(&self, request: &LocationRequest) -> LocationCheck {
        let GeofenceResult { in_range, distance } = self.policy.evaluate(request.latitude, request.longitude);
        let radius = self.policy.radius_meters;

        let message = if !self.policy.enabled {
            "Location check is disabled".to_string()
        } else if in_range {
            format!("You are within the office area ({:.0} m of {:.0} m)", distance, radius)
        } else {
            AttendanceError::OutOfRange { distance, radius }.to_string()
        };

        LocationCheck {
            in_range,
            message,
            need_force: !in_range,
            distance,
            max_radius: radius,
        }
    }

    /// Gate an attendance intent on the geofence, then append it.
    /// Rejected intents return before any repository call.
    pub async fn record(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        kind: AttendanceType,
        request: ClockRequest,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let GeofenceResult { in_range, distance } = self.policy.evaluate(request.latitude, request.longitude);
        let radius = self.policy.radius_meters;

        let status = AttendanceStatus::derive(in_range, request.force);
        if status == AttendanceStatus::Rejected {
            tracing::info!(%user_id, kind = kind.as_str(), distance, radius, "Attendance rejected outside geofence");
            return Err(AttendanceError::OutOfRange { distance, radius });
        }

        self.users
            .find_employee(tenant_id, user_id)
            .await?
            .ok_or(AttendanceError::EmployeeNotFound)?;

        let attendance = self
            .attendances
            .insert(NewAttendance {
                tenant_id,
                user_id,
                kind,
                status,
                latitude: request.latitude,
                longitude: request.longitude,
                photo_selfie: request.photo_selfie,
                in_range,
                force_attendance: request.force,
            })
            .await?;

        tracing::info!(
            %user_id,
            attendance_id = attendance.id,
            kind = kind.as_str(),
            status = status.as_str(),
            distance,
            "Attendance recorded"
        );

        Ok(AttendanceRecord {
            attendance,
            distance,
            max_radius: radius,
        })
    }

    pub async fn clock_in(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        request: ClockRequest,
    ) -> Result<AttendanceRecord, AttendanceError> {
        self.record(tenant_id, user_id, AttendanceType::In, request).await
    }

    pub async fn clock_out(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        request: ClockRequest,
    ) -> Result<AttendanceRecord, AttendanceError> {
        self.record(tenant_id, user_id, AttendanceType::Out, request).await
    }

    /// The caller's own events, newest first.
    pub async fn history(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        query: HistoryQuery,
    ) -> Result<Vec<Attendance>, AttendanceError> {
        Ok(self.attendances.list_for_user(tenant_id, user_id, query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryAttendanceRepository, InMemoryUserRepository};

    const OFFICE: GeofencePolicy = GeofencePolicy {
        center_latitude: -6.2,
        center_longitude: 106.8,
        radius_meters: 100.0,
        enabled: true,
    };

    struct Fixture {
        service: AttendanceService,
        store: Arc<InMemoryAttendanceRepository>,
        tenant_id: Uuid,
        user_id: Uuid,
    }

    fn fixture(policy: GeofencePolicy) -> Fixture {
        let users = Arc::new(InMemoryUserRepository::default());
        let store = Arc::new(InMemoryAttendanceRepository::default());
        let tenant_id = Uuid::new_v4();
        let user_id = users.seed_employee(tenant_id);
        Fixture {
            service: AttendanceService::new(store.clone(), users, policy),
            store,
            tenant_id,
            user_id,
        }
    }

    fn clock(latitude: f64, longitude: f64, force: bool) -> ClockRequest {
        ClockRequest {
            latitude,
            longitude,
            photo_selfie: "AAA".into(),
            force,
        }
    }

    #[tokio::test]
    async fn inside_fence_is_approved() {
        let f = fixture(OFFICE);
        let record = f.service.clock_in(f.tenant_id, f.user_id, clock(-6.20005, 106.80005, false)).await.unwrap();
        assert_eq!(record.attendance.status, AttendanceStatus::Approved);
        assert_eq!(record.attendance.kind, AttendanceType::In);
        assert!(record.attendance.in_range);
        assert!(record.distance < 100.0);
        assert_eq!(record.max_radius, 100.0);
        assert_eq!(record.attendance.photo_selfie, "AAA");
        assert_eq!(f.store.len(), 1);
    }

    #[tokio::test]
    async fn outside_fence_without_force_persists_nothing() {
        let f = fixture(OFFICE);
        let err = f.service.clock_in(f.tenant_id, f.user_id, clock(-6.3, 106.9, false)).await.unwrap_err();
        assert!(matches!(err, AttendanceError::OutOfRange { radius, .. } if radius == 100.0));
        assert!(err.to_string().contains("100 m"));
        assert_eq!(f.store.len(), 0);
    }

    #[tokio::test]
    async fn outside_fence_with_force_is_forced() {
        let f = fixture(OFFICE);
        let record = f.service.clock_out(f.tenant_id, f.user_id, clock(-6.3, 106.9, true)).await.unwrap();
        assert_eq!(record.attendance.status, AttendanceStatus::Forced);
        assert_eq!(record.attendance.kind, AttendanceType::Out);
        assert!(!record.attendance.in_range);
        assert!(record.attendance.force_attendance);
        assert!(record.distance > 100.0);
    }

    #[tokio::test]
    async fn force_inside_fence_is_recorded_but_ignored() {
        let f = fixture(OFFICE);
        let record = f.service.clock_in(f.tenant_id, f.user_id, clock(-6.2, 106.8, true)).await.unwrap();
        assert_eq!(record.attendance.status, AttendanceStatus::Approved);
        assert!(record.attendance.force_attendance);
    }

    #[tokio::test]
    async fn missing_coordinates_are_rejected_unless_forced() {
        let f = fixture(OFFICE);
        assert!(f.service.clock_in(f.tenant_id, f.user_id, ClockRequest::default()).await.is_err());
        let forced = ClockRequest {
            force: true,
            ..ClockRequest::default()
        };
        let record = f.service.clock_in(f.tenant_id, f.user_id, forced).await.unwrap();
        assert_eq!(record.attendance.status, AttendanceStatus::Forced);
    }

    #[tokio::test]
    async fn disabled_check_approves_anywhere() {
        let f = fixture(GeofencePolicy { enabled: false, ..OFFICE });
        let record = f.service.clock_in(f.tenant_id, f.user_id, clock(51.5, -0.12, false)).await.unwrap();
        assert_eq!(record.attendance.status, AttendanceStatus::Approved);
        assert_eq!(record.distance, 0.0);
    }

    #[tokio::test]
    async fn unknown_employee_is_not_found() {
        let f = fixture(OFFICE);
        let err = f.service.clock_in(f.tenant_id, Uuid::new_v4(), clock(-6.2, 106.8, false)).await.unwrap_err();
        assert!(matches!(err, AttendanceError::EmployeeNotFound));

        let err = f.service.clock_in(Uuid::new_v4(), f.user_id, clock(-6.2, 106.8, false)).await.unwrap_err();
        assert!(matches!(err, AttendanceError::EmployeeNotFound));
        assert_eq!(f.store.len(), 0);
    }

    #[tokio::test]
    async fn concurrent_clock_ins_both_succeed() {
        let f = fixture(OFFICE);
        let (a, b) = tokio::join!(
            f.service.clock_in(f.tenant_id, f.user_id, clock(-6.2, 106.8, false)),
            f.service.clock_in(f.tenant_id, f.user_id, clock(-6.2, 106.8, false)),
        );
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(f.store.len(), 2);
    }

    #[tokio::test]
    async fn persisted_rows_satisfy_status_invariants() {
        let f = fixture(OFFICE);
        let points = [(-6.2, 106.8), (-6.2003, 106.8004), (-6.3, 106.9), (0.0, 0.0), (-6.2009, 106.8)];
        for (lat, lon) in points {
            for force in [false, true] {
                let _ = f.service.clock_in(f.tenant_id, f.user_id, clock(lat, lon, force)).await;
            }
        }
        let rows = f.service.history(f.tenant_id, f.user_id, HistoryQuery { date: None, limit: 100 }).await.unwrap();
        assert!(!rows.is_empty());
        for row in rows {
            assert_eq!(row.status == AttendanceStatus::Approved, row.in_range);
            if row.status == AttendanceStatus::Forced {
                assert!(!row.in_range && row.force_attendance);
            }
            assert_ne!(row.status, AttendanceStatus::Rejected);
        }
    }

    #[test]
    fn check_location_reports_need_force() {
        let f = fixture(OFFICE);
        let inside = f.service.check_location(&LocationRequest { latitude: -6.20005, longitude: 106.80005 });
        assert!(inside.in_range && !inside.need_force);
        assert_eq!(inside.max_radius, 100.0);

        let outside = f.service.check_location(&LocationRequest { latitude: -6.3, longitude: 106.9 });
        assert!(!outside.in_range && outside.need_force);
        assert!(outside.distance > 100.0);
        assert_eq!(outside, f.service.check_location(&LocationRequest { latitude: -6.3, longitude: 106.9 }));
        assert_eq!(f.store.len(), 0);
    }
}
