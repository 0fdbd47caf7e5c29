use serde_json::json;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::geofence::GeofencePolicy;

/// Report the point's distance to the office; a point outside the radius is an error.
pub fn handle(config: &AppConfig, latitude: f64, longitude: f64, output_format: OutputFormat) -> anyhow::Result<()> {
    let policy = GeofencePolicy::from_config(&config.attendance);
    let result = policy.evaluate(latitude, longitude);

    let details = json!({
        "in_range": result.in_range,
        "distance": result.distance,
        "max_radius": policy.radius_meters,
        "location_check": policy.enabled,
    });

    if result.in_range {
        return output_success(&output_format, "Inside the attendance radius", Some(details));
    }

    let message = format!(
        "{:.1} m from the office, outside the {} m attendance radius",
        result.distance, policy.radius_meters
    );
    // Text mode leaves the report to the caller's error line
    if let OutputFormat::Json = output_format {
        output_error(&output_format, &message)?;
    }
    anyhow::bail!(message)
}
