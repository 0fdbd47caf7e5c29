// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Protected (bearer token + tenant header)
pub mod public;
pub mod protected;

use axum::{http::Uri, response::IntoResponse};

use crate::error::ApiError;

/// Fallback for unmatched routes
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    ApiError::not_found(format!("No route for {}", uri.path()))
}
