// handlers/public/mod.rs - Endpoints exempt from bearer authentication
pub mod auth;
pub mod health;

pub use health::{health, root};
