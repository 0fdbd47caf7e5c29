//! Circular geofence around the office, measured with the haversine formula.

use serde::Serialize;

use crate::config::AttendanceConfig;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance in meters between two WGS-84 points.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` a hair outside [0, 1]
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeofenceResult {
    pub in_range: bool,
    /// Meters from the office; `0` when location checking is disabled.
    pub distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeofencePolicy {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub radius_meters: f64,
    pub enabled: bool,
}

impl GeofencePolicy {
    pub fn from_config(config: &AttendanceConfig) -> Self {
        Self {
            center_latitude: config.office_latitude,
            center_longitude: config.office_longitude,
            radius_meters: config.radius_meters,
            enabled: config.enable_location_check,
        }
    }

    /// Decide whether a point lies inside the fence. The boundary is inside.
    pub fn evaluate(&self, latitude: f64, longitude: f64) -> GeofenceResult {
        if !self.enabled {
            return GeofenceResult {
                in_range: true,
                distance: 0.0,
            };
        }

        let distance = haversine_distance(self.center_latitude, self.center_longitude, latitude, longitude);
        GeofenceResult {
            in_range: distance <= self.radius_meters,
            distance,
        }
    }
}
