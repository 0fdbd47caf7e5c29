pub mod account_service;
pub mod attendance_service;

pub use account_service::{AccountError, AccountService, AuthResponse, LoginRequest, RegisterRequest};
pub use attendance_service::{
    AttendanceError, AttendanceRecord, AttendanceService, ClockRequest, LocationCheck, LocationRequest,
};
