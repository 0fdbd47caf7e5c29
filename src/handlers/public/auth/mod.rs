// handlers/public/auth/mod.rs - Token acquisition endpoints
//
// Both are tenant-scoped through the X-Tenant-ID header.
pub mod login;
pub mod register;

pub use login::login_post;
pub use register::register_post;
