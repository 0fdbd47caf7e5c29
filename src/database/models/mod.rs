pub mod attendance;
pub mod employee;
pub mod user;

pub use attendance::{Attendance, AttendanceStatus, AttendanceType, NewAttendance};
pub use employee::Employee;
pub use user::{NewUser, User, UserResponse};
