// handlers/protected/attendance/mod.rs - Geofenced attendance endpoints
pub mod check_location;
pub mod clock;
pub mod history;

pub use check_location::check_location_post;
pub use clock::{clock_in_post, clock_out_post};
pub use history::attendance_get;
