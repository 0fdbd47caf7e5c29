use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::auth::Claims;
use crate::error::ApiError;
use crate::AppState;

/// Prefix of every routed path; anything outside falls through to the 404 fallback.
pub const API_PREFIX: &str = "/api/v1/";

/// Paths served without a bearer token, matched exactly.
pub const PUBLIC_PATHS: &[&str] = &[
    "/api/v1",
    "/api/v1/",
    "/api/v1/auth/register",
    "/api/v1/auth/login",
    "/api/v1/health",
];

/// Authenticated principal attached to request extensions by [`jwt_auth_middleware`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            role: claims.role,
        }
    }
}

pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

fn requires_auth(path: &str) -> bool {
    path.starts_with(API_PREFIX) && !is_public_path(path)
}

/// JWT authentication middleware that validates tokens and extracts user context.
/// Performs no database work.
pub async fn jwt_auth_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    if !requires_auth(request.uri().path()) {
        return next.run(request).await;
    }

    let token = match extract_bearer_token(request.headers()) {
        Ok(token) => token,
        Err(msg) => {
            tracing::debug!(path = %request.uri().path(), "Rejecting request: {}", msg);
            return ApiError::unauthorized("Authentication required").into_response();
        }
    };

    let claims = match state.tokens.validate(token) {
        Ok(claims) => claims,
        Err(e) => return ApiError::from(e).into_response(),
    };

    request.extensions_mut().insert(AuthUser::from(claims));
    next.run(request).await
}

/// Extract JWT token from Authorization header. The scheme is case-sensitive.
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers.get(AUTHORIZATION).ok_or("Missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err("Empty JWT token"),
        None => Err("Authorization header must use Bearer token format"),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}
