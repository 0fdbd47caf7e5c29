// handlers/protected/mod.rs - Bearer-authenticated, tenant-scoped endpoints
pub mod attendance;
pub mod auth;
